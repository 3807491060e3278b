use std::fmt::Write as _;

use tellmemo_core::SummaryRecord;

use crate::sections::{metadata, sections};

/// Render a summary as CommonMark.
pub fn render(summary: &SummaryRecord) -> Vec<u8> {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", single_line(&summary.subject));

    let meta: Vec<String> =
        metadata(summary).into_iter().map(|(label, value)| format!("**{label}:** {value}")).collect();
    let _ = writeln!(out, "{}\n", meta.join(" | "));

    let _ = writeln!(out, "## Overview\n");
    let body = summary.body.trim();
    if !body.is_empty() {
        let _ = writeln!(out, "{body}\n");
    }

    for section in sections(summary) {
        let _ = writeln!(out, "## {}\n", section.title);
        for item in &section.items {
            let _ = writeln!(out, "- {}", single_line(&item.text));
            for (label, value) in &item.details {
                let _ = writeln!(out, "  - *{label}:* {}", single_line(value));
            }
        }
        out.push('\n');
    }

    out.into_bytes()
}

// A newline inside a list item or heading would break the document structure.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
