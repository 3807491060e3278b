//! `tellmemo-export`: render summaries to files and hand them to the user.
//!
//! Renderers are pure (`&SummaryRecord -> Vec<u8>`); delivery and user
//! notification live in [`service`].

pub mod delivery;
pub mod error;
pub mod filename;
pub mod format;
pub mod html;
pub mod json;
pub mod markdown;
pub mod pdf;
pub mod sections;
pub mod service;

pub use delivery::{Delivered, Destination, DownloadSink, ExportedFile, ShareSheet};
pub use error::ExportError;
pub use filename::export_filename;
pub use format::ExportFormat;
pub use json::summary_from_json;
pub use service::ExportService;
