//! Shared tracing setup.

/// Initialize process-wide tracing with JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init_with(tracing::LogFormat::Json);
}

pub use self::tracing::{LogFormat, ParseLogFormatError, init_with};

/// Subscriber configuration (format, filters).
pub mod tracing;
