//! Tracing/logging setup shared by the client binaries and tests.

/// Initialize process-wide logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(LogFormat::Json);
}

pub use self::tracing::{LogFormat, ParseLogFormatError, init_with};

/// Tracing configuration (filters, layers).
pub mod tracing;
