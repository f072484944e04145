//! Compliance evaluation engine

use fleetcheck_core::{Device, InventorySource};
use fleetcheck_telemetry::RunMetrics;
use tracing::{debug, warn};

use crate::predicate::{DetailKind, EvaluationContext, Predicate, Subject, Verdict};
use crate::report::format_report;
use crate::violation::Violation;

/// Applies one predicate across an inventory snapshot
pub struct ComplianceEngine {
    predicate: Box<dyn Predicate>,
    metrics: RunMetrics,
}

impl ComplianceEngine {
    /// Create an engine for the given predicate
    pub fn new(predicate: impl Predicate + 'static) -> Self {
        Self::from_boxed(Box::new(predicate))
    }

    /// Create an engine for a predicate chosen at runtime
    pub fn from_boxed(predicate: Box<dyn Predicate>) -> Self {
        let metrics = RunMetrics::new(predicate.name());
        Self { predicate, metrics }
    }

    /// Record into the given counters instead of fresh ones
    pub fn with_metrics(mut self, metrics: RunMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn predicate(&self) -> &dyn Predicate {
        self.predicate.as_ref()
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Evaluate every device in inventory order.
    ///
    /// Devices carrying the predicate's exclusion tag are skipped. When the
    /// predicate needs a detail record the engine fetches it; a device whose
    /// fetch fails is skipped and logged, never reported.
    pub async fn evaluate(
        &self,
        inventory: &[Device],
        source: &dyn InventorySource,
        ctx: &EvaluationContext,
    ) -> Vec<Violation> {
        let check = self.predicate.name();
        let mut violations = Vec::new();

        for device in inventory {
            self.metrics.record_scanned();

            if let Some(tag) = self.predicate.exclusion_tag() {
                if device.has_tag(tag) {
                    debug!(check, device_id = %device.device_id, tag, "Skipping excluded device");
                    self.metrics.record_excluded();
                    continue;
                }
            }

            let mut details = None;
            let mut status = None;

            match self.predicate.detail_kind() {
                DetailKind::None => {}
                DetailKind::Details => match source.fetch_device_details(&device.device_id).await {
                    Ok(fetched) => details = Some(fetched),
                    Err(e) => {
                        warn!(check, device_id = %device.device_id, error = %e, "Skipping device, details request failed");
                        self.metrics.record_detail_failure();
                        continue;
                    }
                },
                DetailKind::Status => match source.fetch_device_status(&device.device_id).await {
                    Ok(fetched) => status = Some(fetched),
                    Err(e) => {
                        warn!(check, device_id = %device.device_id, error = %e, "Skipping device, status request failed");
                        self.metrics.record_detail_failure();
                        continue;
                    }
                },
            }

            let subject = Subject {
                device,
                details: details.as_ref(),
                status: status.as_ref(),
            };

            match self.predicate.evaluate(&subject, ctx) {
                Verdict::Violations(found) => {
                    debug!(check, device_id = %device.device_id, count = found.len(), "Violation");
                    self.metrics.record_violations(found.len() as u64);
                    violations.extend(found);
                }
                Verdict::Unparsable(e) => {
                    warn!(check, device_id = %device.device_id, error = %e, "Treating device as compliant, field could not be parsed");
                    self.metrics.record_parse_skip();
                }
                Verdict::Compliant | Verdict::NotApplicable => {}
            }
        }

        violations
    }

    /// Render the run's report message
    pub fn render(&self, violations: &[Violation], ctx: &EvaluationContext) -> String {
        let layout = self.predicate.report_layout(violations, ctx);
        format_report(violations, &layout)
    }
}
