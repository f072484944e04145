//! Compliance predicate definitions

use chrono::{DateTime, Utc};
use fleetcheck_core::{Device, DeviceDetails, DeviceStatus, ParseError};

use crate::report::ReportLayout;
use crate::violation::Violation;

/// Extra per-device record a predicate needs before it can decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    /// The inventory listing is enough
    None,
    /// `/devices/{id}/details` (volumes, assigned user)
    Details,
    /// `/devices/{id}/status` (library items)
    Status,
}

/// A device together with whichever detail record its predicate asked for
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub device: &'a Device,
    pub details: Option<&'a DeviceDetails>,
    pub status: Option<&'a DeviceStatus>,
}

impl<'a> Subject<'a> {
    /// A subject with no detail records attached
    pub fn device(device: &'a Device) -> Self {
        Self {
            device,
            details: None,
            status: None,
        }
    }

    pub fn with_details(mut self, details: &'a DeviceDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: &'a DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Values fixed for the duration of one run
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext {
    /// Reference time for every age computation in the run
    pub now: DateTime<Utc>,
}

impl EvaluationContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Context anchored at the current wall-clock time
    pub fn now() -> Self {
        Self::new(Utc::now())
    }
}

/// Outcome of applying one predicate to one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The device passes
    Compliant,

    /// The predicate does not cover this device (platform, missing volume, empty version)
    NotApplicable,

    /// One or more violations, in device order
    Violations(Vec<Violation>),

    /// A field the predicate depends on could not be parsed; treated as not violating
    Unparsable(ParseError),
}

impl Verdict {
    /// A verdict carrying a single violation
    pub fn violation(violation: Violation) -> Self {
        Self::Violations(vec![violation])
    }

    /// Turn a possibly empty violation list into a verdict
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Compliant
        } else {
            Self::Violations(violations)
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violations(_))
    }
}

/// A pure compliance rule evaluated independently per device.
///
/// Predicates never mutate the device; everything they need arrives through
/// the [`Subject`] and the [`EvaluationContext`].
pub trait Predicate: Send + Sync {
    /// Check name used in logs, metrics, and the CLI
    fn name(&self) -> &str;

    /// Tag that removes a device from this predicate's evaluation
    fn exclusion_tag(&self) -> Option<&str>;

    /// Detail record the engine must fetch before calling [`Predicate::evaluate`]
    fn detail_kind(&self) -> DetailKind {
        DetailKind::None
    }

    /// Evaluate one device
    fn evaluate(&self, subject: &Subject<'_>, ctx: &EvaluationContext) -> Verdict;

    /// Header, all-clear sentence, and optional preamble for this check's report
    fn report_layout(&self, violations: &[Violation], ctx: &EvaluationContext) -> ReportLayout;
}
