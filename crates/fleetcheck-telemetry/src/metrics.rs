//! Run counters and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

const DEVICES_SCANNED: &str = "fleetcheck_devices_scanned_total";
const DEVICES_EXCLUDED: &str = "fleetcheck_devices_excluded_total";
const DETAIL_FAILURES: &str = "fleetcheck_detail_failures_total";
const PARSE_SKIPS: &str = "fleetcheck_parse_skips_total";
const VIOLATIONS: &str = "fleetcheck_violations_total";

/// Register descriptions for every FleetCheck counter
pub fn describe_metrics() {
    ::metrics::describe_counter!(DEVICES_SCANNED, "Devices read from the inventory");
    ::metrics::describe_counter!(
        DEVICES_EXCLUDED,
        "Devices skipped because they carry the check's exclusion tag"
    );
    ::metrics::describe_counter!(
        DETAIL_FAILURES,
        "Devices skipped because their detail or status request failed"
    );
    ::metrics::describe_counter!(
        PARSE_SKIPS,
        "Devices skipped because a field could not be parsed"
    );
    ::metrics::describe_counter!(VIOLATIONS, "Compliance violations found");
}

/// Counters for one compliance check run
#[derive(Clone)]
pub struct RunMetrics {
    check: String,
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    devices_scanned: AtomicU64,
    devices_excluded: AtomicU64,
    detail_failures: AtomicU64,
    parse_skips: AtomicU64,
    violations: AtomicU64,
}

impl RunMetrics {
    /// Create counters labelled with the check name
    pub fn new(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Name of the check these counters belong to
    pub fn check(&self) -> &str {
        &self.check
    }

    /// Record a device read from the inventory
    pub fn record_scanned(&self) {
        self.inner.devices_scanned.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(DEVICES_SCANNED, "check" => self.check.clone()).increment(1);
    }

    /// Record a device skipped by its exclusion tag
    pub fn record_excluded(&self) {
        self.inner.devices_excluded.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(DEVICES_EXCLUDED, "check" => self.check.clone()).increment(1);
    }

    /// Record a failed detail or status request
    pub fn record_detail_failure(&self) {
        self.inner.detail_failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(DETAIL_FAILURES, "check" => self.check.clone()).increment(1);
    }

    /// Record a device whose field could not be parsed
    pub fn record_parse_skip(&self) {
        self.inner.parse_skips.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(PARSE_SKIPS, "check" => self.check.clone()).increment(1);
    }

    /// Record violations found on one device
    pub fn record_violations(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.inner.violations.fetch_add(count, Ordering::Relaxed);
        ::metrics::counter!(VIOLATIONS, "check" => self.check.clone()).increment(count);
    }

    /// Get current counter snapshot
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            devices_scanned: self.inner.devices_scanned.load(Ordering::Relaxed),
            devices_excluded: self.inner.devices_excluded.load(Ordering::Relaxed),
            detail_failures: self.inner.detail_failures.load(Ordering::Relaxed),
            parse_skips: self.inner.parse_skips.load(Ordering::Relaxed),
            violations: self.inner.violations.load(Ordering::Relaxed),
        }
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            check = %self.check,
            scanned = snapshot.devices_scanned,
            excluded = snapshot.devices_excluded,
            detail_failures = snapshot.detail_failures,
            parse_skips = snapshot.parse_skips,
            evaluated = snapshot.evaluated(),
            violations = snapshot.violations,
            "Check finished"
        );
    }
}

/// Snapshot of run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    pub devices_scanned: u64,
    pub devices_excluded: u64,
    pub detail_failures: u64,
    pub parse_skips: u64,
    pub violations: u64,
}

impl RunSnapshot {
    /// Devices that reached a verdict (neither excluded nor skipped on a failed fetch)
    pub fn evaluated(&self) -> u64 {
        self.devices_scanned
            .saturating_sub(self.devices_excluded)
            .saturating_sub(self.detail_failures)
    }
}
