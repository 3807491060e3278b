use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("file write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}
