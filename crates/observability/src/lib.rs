//! Process-wide tracing setup shared by every binary.

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Subscriber configuration (filter, formatting).
pub mod tracing;
