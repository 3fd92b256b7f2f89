//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::LogFormat;
