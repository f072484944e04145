//! FleetCheck Telemetry
//!
//! Per-run counters for compliance checks.
//!
//! Every counter is kept locally for the end-of-run summary and mirrored to
//! the `metrics` facade, so an installed recorder sees the same numbers.

pub mod metrics;

pub use crate::metrics::{describe_metrics, RunMetrics, RunSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{RunMetrics, RunSnapshot};
}
