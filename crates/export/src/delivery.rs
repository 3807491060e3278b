//! Where rendered exports go.

use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::ExportError;

/// A rendered export, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Browser-style download (web builds).
pub trait DownloadSink: Send + Sync {
    fn download(&self, file: &ExportedFile) -> Result<(), ExportError>;
}

/// Platform share sheet (mobile builds).
pub trait ShareSheet: Send + Sync {
    fn share(&self, file: &ExportedFile, subject: &str) -> Result<(), ExportError>;
}

#[derive(Clone)]
pub enum Destination {
    Directory(PathBuf),
    Download(Arc<dyn DownloadSink>),
    Share(Arc<dyn ShareSheet>),
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            Destination::Download(_) => f.write_str("Download(..)"),
            Destination::Share(_) => f.write_str("Share(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Saved(PathBuf),
    Downloaded(String),
    Shared(String),
}

impl Delivered {
    /// Text for the success notice.
    pub fn describe(&self) -> String {
        match self {
            Delivered::Saved(path) => format!("Saved to {}", path.display()),
            Delivered::Downloaded(name) => format!("Downloaded {name}"),
            Delivered::Shared(name) => format!("Shared {name}"),
        }
    }
}

pub(crate) fn deliver(
    file: &ExportedFile,
    subject: &str,
    destination: &Destination,
) -> Result<Delivered, ExportError> {
    match destination {
        Destination::Directory(dir) => save_to_directory(file, dir).map(Delivered::Saved),
        Destination::Download(sink) => {
            sink.download(file)?;
            Ok(Delivered::Downloaded(file.filename.clone()))
        }
        Destination::Share(sheet) => {
            sheet.share(file, subject)?;
            Ok(Delivered::Shared(file.filename.clone()))
        }
    }
}

/// Writes through a temporary file in `dir` and renames it into place, so a
/// failed write never leaves a truncated export behind.
pub fn save_to_directory(file: &ExportedFile, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(&file.filename);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&file.bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;

    tracing::debug!(path = %target.display(), bytes = file.bytes.len(), "export written");
    Ok(target)
}
