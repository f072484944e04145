//! FleetCheck Policy Engine
//!
//! Compliance predicates for an MDM-managed fleet, the engine that applies
//! them to an inventory snapshot, and the renderer for the resulting report.
//!
//! Each predicate is a pure per-device rule with:
//! - An optional exclusion tag that removes a device from that rule only
//! - The detail record it needs (none, `details`, or `status`)
//! - A report layout (header, all-clear sentence, optional preamble)

pub mod disk_usage;
pub mod engine;
pub mod os_currency;
pub mod policy_error;
pub mod predicate;
pub mod report;
pub mod staleness;
pub mod violation;

pub use disk_usage::{DiskUsageCheck, EXCLUDE_DISK_TAG, SYSTEM_VOLUME};
pub use engine::ComplianceEngine;
pub use os_currency::{OsCurrencyCheck, EXCLUDE_OS_TAG};
pub use policy_error::PolicyErrorCheck;
pub use predicate::{DetailKind, EvaluationContext, Predicate, Subject, Verdict};
pub use report::{format_report, render_block, ReportLayout};
pub use staleness::{StalenessCheck, EXCLUDE_STALE_TAG};
pub use violation::{Violation, ViolationDetail};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::ComplianceEngine;
    pub use crate::predicate::{EvaluationContext, Predicate, Verdict};
    pub use crate::report::{format_report, ReportLayout};
    pub use crate::violation::{Violation, ViolationDetail};
    pub use crate::{DiskUsageCheck, OsCurrencyCheck, PolicyErrorCheck, StalenessCheck};
}
