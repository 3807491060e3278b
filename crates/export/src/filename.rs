//! Deterministic export file names.

use chrono::NaiveDate;

use crate::format::ExportFormat;

/// `{subject}_{YYYY-MM-DD}.{ext}` with every whitespace character turned
/// into `_`, leading and trailing ones included.
///
/// Path separators and other characters common filesystems reject are
/// replaced too; a blank subject becomes `summary`.
pub fn export_filename(subject: &str, date: NaiveDate, format: ExportFormat) -> String {
    if subject.trim().is_empty() {
        return format!("summary_{}.{}", date.format("%Y-%m-%d"), format.extension());
    }
    let stem: String = subject
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("{stem}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}
