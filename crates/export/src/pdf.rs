//! PDF export, laid out by `genpdf`.
//!
//! DejaVu Sans is embedded in the binary and in every document, so any
//! script the font covers (Latin, Cyrillic, Greek and more) renders as-is.

use genpdf::elements::{Break, LinearLayout, Paragraph, StyledElement, UnorderedList};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::Style;
use genpdf::{Document, Element as _, SimplePageDecorator};

use tellmemo_core::SummaryRecord;

use crate::error::ExportError;
use crate::sections::{metadata, sections};

const REGULAR_TTF: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const BOLD_TTF: &[u8] = include_bytes!("../fonts/DejaVuSans-Bold.ttf");

const BODY_SIZE: u8 = 11;

fn font_family() -> Result<FontFamily<FontData>, ExportError> {
    let regular = FontData::new(REGULAR_TTF.to_vec(), None)?;
    let bold = FontData::new(BOLD_TTF.to_vec(), None)?;
    Ok(FontFamily { italic: regular.clone(), bold_italic: bold.clone(), regular, bold })
}

pub fn render(summary: &SummaryRecord) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::new(font_family()?);
    doc.set_title(summary.subject.clone());
    doc.set_font_size(BODY_SIZE);
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(20);
    doc.set_page_decorator(decorator);

    doc.push(Paragraph::new(summary.subject.clone()).styled(Style::new().bold().with_font_size(18)));
    let meta: Vec<String> =
        metadata(summary).into_iter().map(|(label, value)| format!("{label}: {value}")).collect();
    doc.push(Paragraph::new(meta.join("  |  ")).styled(Style::new().with_font_size(9)));
    doc.push(Break::new(1));

    doc.push(heading("Overview"));
    for paragraph in summary.body.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        doc.push(Paragraph::new(paragraph.split_whitespace().collect::<Vec<_>>().join(" ")));
        doc.push(Break::new(0.5));
    }

    for section in sections(summary) {
        doc.push(Break::new(0.5));
        doc.push(heading(section.title));
        let mut list = UnorderedList::new();
        for item in &section.items {
            let mut entry = LinearLayout::vertical();
            entry.push(Paragraph::new(item.text.clone()));
            for (label, value) in &item.details {
                entry.push(Paragraph::new(format!("{label}: {value}")).styled(Style::new().with_font_size(9)));
            }
            list.push(entry);
        }
        doc.push(list);
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)?;
    Ok(bytes)
}

fn heading(title: &str) -> StyledElement<Paragraph> {
    Paragraph::new(title.to_owned()).styled(Style::new().bold().with_font_size(13))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellmemo_core::ActionItem;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// `/Page` names, not counting `/Pages` or other `/Page...` keys.
    fn page_count(pdf: &[u8]) -> usize {
        pdf.windows(6).filter(|w| &w[..5] == b"/Page" && !w[5].is_ascii_alphanumeric()).count()
    }

    #[test]
    fn renders_a_pdf_document() {
        let pdf = render(&SummaryRecord::new("Weekly Sync", "Roadmap (v2) reviewed.")).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let tail = &pdf[pdf.len().saturating_sub(32)..];
        assert!(contains(tail, b"%%EOF"));
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn long_content_spans_pages() {
        let mut summary = SummaryRecord::new("Quarterly planning", "Intro.");
        for i in 0..150 {
            summary.action_items.push(ActionItem::new(format!("Follow up on item number {i}")));
        }
        let pdf = render(&summary).unwrap();
        assert!(page_count(&pdf) >= 3, "expected several pages, got {}", page_count(&pdf));
    }

    #[test]
    fn non_latin_subject_uses_the_embedded_font() {
        let subject = "Планёрка команды";
        for ttf in [REGULAR_TTF, BOLD_TTF] {
            let font = rusttype::Font::try_from_bytes(ttf).unwrap();
            for c in subject.chars().filter(|c| !c.is_whitespace()) {
                assert_ne!(font.glyph(c).id().0, 0, "no glyph for {c:?}");
            }
        }

        let pdf = render(&SummaryRecord::new(subject, "Итоги недели.")).unwrap();
        assert!(contains(&pdf, b"FontFile2"));
        assert!(contains(&pdf, b"Identity-H"));
        assert!(!contains(&pdf, b"/Helvetica"));
    }
}
