//! Library item errors

use fleetcheck_core::{ItemStatus, UNKNOWN};

use crate::predicate::{DetailKind, EvaluationContext, Predicate, Subject, Verdict};
use crate::report::ReportLayout;
use crate::violation::{Violation, ViolationDetail};

const NO_LOG: &str = "No log available";

/// Reports every managed library item in the `ERROR` state.
///
/// One violation per failing item. Only the first `log_lines` lines of the
/// item's log are kept; longer logs are cut, not wrapped.
#[derive(Debug, Clone)]
pub struct PolicyErrorCheck {
    log_lines: usize,
}

impl PolicyErrorCheck {
    pub fn new() -> Self {
        Self { log_lines: 2 }
    }

    pub fn with_log_lines(mut self, log_lines: usize) -> Self {
        self.log_lines = log_lines;
        self
    }

    fn excerpt(&self, log: Option<&str>) -> String {
        match log {
            Some(log) => log
                .lines()
                .take(self.log_lines)
                .collect::<Vec<_>>()
                .join("\n"),
            None => NO_LOG.to_string(),
        }
    }
}

impl Default for PolicyErrorCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate for PolicyErrorCheck {
    fn name(&self) -> &str {
        "errors"
    }

    fn exclusion_tag(&self) -> Option<&str> {
        None
    }

    fn detail_kind(&self) -> DetailKind {
        DetailKind::Status
    }

    fn evaluate(&self, subject: &Subject<'_>, _ctx: &EvaluationContext) -> Verdict {
        let Some(status) = subject.status else {
            return Verdict::NotApplicable;
        };

        let violations = status
            .library_items
            .iter()
            .filter(|item| item.status == ItemStatus::Error)
            .map(|item| {
                Violation::for_device(
                    subject.device,
                    ViolationDetail::PolicyError {
                        item: item.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                        log_excerpt: self.excerpt(item.log.as_deref()),
                    },
                )
            })
            .collect();

        Verdict::from_violations(violations)
    }

    fn report_layout(&self, _violations: &[Violation], _ctx: &EvaluationContext) -> ReportLayout {
        ReportLayout::new("Device Errors Detected:", "No device errors detected.")
    }
}
