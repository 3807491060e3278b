use std::sync::Arc;

use tellmemo_core::{Notifier, SummaryRecord};

use crate::delivery::{self, Delivered, Destination, ExportedFile};
use crate::error::ExportError;
use crate::filename::export_filename;
use crate::format::ExportFormat;
use crate::{html, json, markdown, pdf};

/// Renders summaries and delivers them, reporting the outcome to the user.
#[derive(Clone)]
pub struct ExportService {
    notifier: Arc<dyn Notifier>,
}

impl ExportService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Render without delivering.
    pub fn render(summary: &SummaryRecord, format: ExportFormat) -> Result<ExportedFile, ExportError> {
        let bytes = match format {
            ExportFormat::Pdf => pdf::render(summary)?,
            ExportFormat::Docx => html::render(summary),
            ExportFormat::Markdown => markdown::render(summary),
            ExportFormat::Json => json::render(summary)?,
        };
        Ok(ExportedFile {
            filename: export_filename(&summary.subject, summary.created_at.date_naive(), format),
            mime_type: format.mime_type(),
            bytes,
        })
    }

    /// Render and deliver. Every failure is also reported through the
    /// notifier as `Export failed: {error}`; nothing is retried.
    pub fn export(
        &self,
        summary: &SummaryRecord,
        format: ExportFormat,
        destination: &Destination,
    ) -> Result<Delivered, ExportError> {
        let outcome = Self::render(summary, format)
            .and_then(|file| delivery::deliver(&file, &summary.subject, destination));

        match &outcome {
            Ok(delivered) => {
                tracing::info!(summary_id = %summary.id, format = format.label(), ?delivered, "summary exported");
                self.notifier.success(&format!("{} export ready. {}", format.label(), delivered.describe()));
            }
            Err(e) => {
                tracing::warn!(summary_id = %summary.id, format = format.label(), error = %e, "export failed");
                self.notifier.error(&format!("Export failed: {e}"));
            }
        }
        outcome
    }
}
