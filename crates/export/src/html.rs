//! Word-openable HTML, saved as the `.doc`-style export.
//!
//! Word and LibreOffice both open HTML carrying the Office namespaces; this is
//! the whole "DOCX" support.

use std::fmt::Write as _;

use tellmemo_core::SummaryRecord;

use crate::sections::{metadata, sections};

const STYLE: &str = "body{font-family:Calibri,Arial,sans-serif;font-size:11pt;line-height:1.4}\
h1{font-size:20pt;margin-bottom:4pt}h2{font-size:14pt;margin-top:16pt}\
.meta{color:#555555}.detail{color:#444444;font-size:10pt}";

pub fn render(summary: &SummaryRecord) -> Vec<u8> {
    let mut out = String::new();
    let title = escape(&summary.subject);

    out.push_str(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
         xmlns:w=\"urn:schemas-microsoft-com:office:word\" \
         xmlns=\"http://www.w3.org/TR/REC-html40\">\n",
    );
    let _ = writeln!(
        out,
        "<head><meta charset=\"utf-8\"><title>{title}</title>\
         <!--[if gte mso 9]><xml><w:WordDocument><w:View>Print</w:View></w:WordDocument></xml><![endif]-->\
         <style>{STYLE}</style></head>"
    );
    out.push_str("<body>\n");
    let _ = writeln!(out, "<h1>{title}</h1>");

    let meta: Vec<String> = metadata(summary)
        .into_iter()
        .map(|(label, value)| format!("<b>{label}:</b> {}", escape(&value)))
        .collect();
    let _ = writeln!(out, "<p class=\"meta\">{}</p>", meta.join(" &middot; "));

    out.push_str("<h2>Overview</h2>\n");
    for paragraph in summary.body.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let _ = writeln!(out, "<p>{}</p>", escape(paragraph).replace('\n', "<br>"));
    }

    for section in sections(summary) {
        let _ = writeln!(out, "<h2>{}</h2>\n<ul>", section.title);
        for item in &section.items {
            let _ = write!(out, "<li>{}", escape(&item.text));
            for (label, value) in &item.details {
                let _ = write!(out, "<br><span class=\"detail\"><i>{label}:</i> {}</span>", escape(value));
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</body>\n</html>\n");
    out.into_bytes()
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellmemo_core::ActionItem;

    #[test]
    fn markup_is_escaped() {
        let mut summary = SummaryRecord::new("R&D <sync>", "a < b");
        summary.action_items.push(ActionItem::new("Fix \"quotes\""));

        let html = String::from_utf8(render(&summary)).unwrap();
        assert!(html.contains("<h1>R&amp;D &lt;sync&gt;</h1>"));
        assert!(html.contains("<p>a &lt; b</p>"));
        assert!(html.contains("<li>Fix &quot;quotes&quot;</li>"));
        assert!(!html.contains("<sync>"));
    }

    #[test]
    fn carries_office_namespaces_and_skips_empty_sections() {
        let html = String::from_utf8(render(&SummaryRecord::new("Sync", "Body"))).unwrap();
        assert!(html.contains("urn:schemas-microsoft-com:office:word"));
        assert!(html.contains("<h2>Overview</h2>"));
        assert!(!html.contains("<ul>"));
    }
}
