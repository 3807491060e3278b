//! Format-independent view of a summary's optional sections.
//!
//! Every renderer walks the same list, so "absent sections are omitted" only
//! has to hold here: a section appears only if it has at least one item.

use tellmemo_core::SummaryRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionItem {
    pub text: String,
    /// Labelled extras such as owner or due date, in display order.
    pub details: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub items: Vec<SectionItem>,
}

impl SectionItem {
    fn plain(text: &str) -> Self {
        Self { text: text.to_owned(), details: Vec::new() }
    }

    fn new(text: &str, details: [(&'static str, &Option<String>); 3]) -> Self {
        Self {
            text: text.to_owned(),
            details: details
                .into_iter()
                .filter_map(|(label, value)| {
                    value
                        .as_deref()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| (label, v.to_owned()))
                })
                .collect(),
        }
    }
}

const NONE: &Option<String> = &None;

/// Non-empty sections in document order.
pub fn sections(summary: &SummaryRecord) -> Vec<Section> {
    let candidates = [
        Section {
            title: "Key Points",
            items: summary.key_points.iter().map(|p| SectionItem::plain(p)).collect(),
        },
        Section {
            title: "Risks",
            items: summary
                .risks
                .iter()
                .map(|r| {
                    SectionItem::new(
                        &r.title,
                        [("Severity", &r.severity), ("Details", &r.description), ("Mitigation", &r.mitigation)],
                    )
                })
                .collect(),
        },
        Section {
            title: "Blockers",
            items: summary
                .blockers
                .iter()
                .map(|b| {
                    SectionItem::new(
                        &b.title,
                        [("Impact", &b.impact), ("Owner", &b.owner), ("Details", &b.description)],
                    )
                })
                .collect(),
        },
        Section {
            title: "Action Items",
            items: summary
                .action_items
                .iter()
                .map(|a| {
                    SectionItem::new(
                        &a.description,
                        [("Assignee", &a.assignee), ("Due", &a.due_date), ("Urgency", &a.urgency)],
                    )
                })
                .collect(),
        },
        Section {
            title: "Decisions",
            items: summary
                .decisions
                .iter()
                .map(|d| {
                    SectionItem::new(
                        &d.description,
                        [("Importance", &d.importance), ("Rationale", &d.rationale), ("", NONE)],
                    )
                })
                .collect(),
        },
        Section {
            title: "Agenda",
            items: summary.agenda.iter().map(|a| SectionItem::plain(a)).collect(),
        },
        Section {
            title: "Lessons Learned",
            items: summary
                .lessons_learned
                .iter()
                .map(|l| {
                    SectionItem::new(
                        &l.title,
                        [("Category", &l.category), ("Details", &l.description), ("", NONE)],
                    )
                })
                .collect(),
        },
        Section {
            title: "Open Questions",
            items: summary
                .open_questions
                .iter()
                .map(|q| {
                    SectionItem::new(&q.question, [("Raised by", &q.raised_by), ("", NONE), ("", NONE)])
                })
                .collect(),
        },
    ];

    candidates.into_iter().filter(|s| !s.items.is_empty()).collect()
}

/// Header lines shown under the title: type, date and author.
pub fn metadata(summary: &SummaryRecord) -> Vec<(&'static str, String)> {
    let mut meta = vec![
        ("Type", summary.summary_type.label().to_string()),
        ("Date", summary.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
    ];
    if let Some(author) = summary.created_by.as_deref().filter(|a| !a.trim().is_empty()) {
        meta.push(("Author", author.to_string()));
    }
    meta
}
