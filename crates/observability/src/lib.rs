//! Logging setup shared by the stock-take binaries.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;
