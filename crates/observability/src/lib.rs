//! Process-wide tracing setup.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Same as [`init`], with an explicit output format.
pub fn init_with(format: LogFormat) {
    tracing::init(format);
}
