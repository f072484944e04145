//! System volume usage

use fleetcheck_core::{parse_percentage, UNKNOWN};

use crate::predicate::{DetailKind, EvaluationContext, Predicate, Subject, Verdict};
use crate::report::ReportLayout;
use crate::violation::{Violation, ViolationDetail};

/// Default exclusion tag for the disk usage check
pub const EXCLUDE_DISK_TAG: &str = "exclude_hd70";

/// Volume inspected by default
pub const SYSTEM_VOLUME: &str = "Macintosh HD";

/// Flags devices whose system volume is more than `threshold` percent used.
///
/// Only the volume named exactly `volume_name` is inspected. A non-numeric
/// `percent_used` is reported as [`Verdict::Unparsable`], never as a violation.
#[derive(Debug, Clone)]
pub struct DiskUsageCheck {
    volume_name: String,
    threshold: u32,
    exclusion_tag: String,
}

impl DiskUsageCheck {
    pub fn new() -> Self {
        Self {
            volume_name: SYSTEM_VOLUME.to_string(),
            threshold: 69,
            exclusion_tag: EXCLUDE_DISK_TAG.to_string(),
        }
    }

    /// Violate when usage is strictly above this percentage
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_volume_name(mut self, volume_name: impl Into<String>) -> Self {
        self.volume_name = volume_name.into();
        self
    }

    pub fn with_exclusion_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclusion_tag = tag.into();
        self
    }

    /// Lowest usage that violates, as shown in the report
    fn reported_limit(&self) -> u32 {
        self.threshold.saturating_add(1)
    }
}

impl Default for DiskUsageCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate for DiskUsageCheck {
    fn name(&self) -> &str {
        "disk-usage"
    }

    fn exclusion_tag(&self) -> Option<&str> {
        Some(&self.exclusion_tag)
    }

    fn detail_kind(&self) -> DetailKind {
        DetailKind::Details
    }

    fn evaluate(&self, subject: &Subject<'_>, _ctx: &EvaluationContext) -> Verdict {
        let Some(details) = subject.details else {
            return Verdict::NotApplicable;
        };
        let Some(volume) = details.volume(&self.volume_name) else {
            return Verdict::NotApplicable;
        };

        let percent_used = match parse_percentage(volume.percent_used.as_deref().unwrap_or("0%")) {
            Ok(percent) => percent,
            Err(err) => return Verdict::Unparsable(err),
        };

        if percent_used <= self.threshold {
            return Verdict::Compliant;
        }

        let device = subject.device;
        let user = details.assigned_user().unwrap_or(device.user.as_str()).to_string();

        Verdict::violation(
            Violation::for_device(
                device,
                ViolationDetail::DiskUsage {
                    serial_number: device.serial_number.clone(),
                    volume: self.volume_name.clone(),
                    capacity: volume.capacity.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                    available: volume.available.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                    percent_used,
                },
            )
            .with_user(user),
        )
    }

    fn report_layout(&self, violations: &[Violation], _ctx: &EvaluationContext) -> ReportLayout {
        ReportLayout::new(
            format!(
                "{} volumes found with over {}% usage:",
                violations.len(),
                self.reported_limit()
            ),
            format!("No volumes found with over {}% usage.", self.reported_limit()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcheck_core::{Device, DeviceDetails, ParseError};

    fn details(percent_used: &str) -> DeviceDetails {
        serde_json::from_str(&format!(
            r#"{{"volumes": [
                {{"name": "Preboot", "percent_used": "99%"}},
                {{"name": "Macintosh HD", "percent_used": "{}", "capacity": "494.38 GB", "available": "120.1 GB"}}
            ]}}"#,
            percent_used
        ))
        .unwrap()
    }

    fn verdict(details: &DeviceDetails) -> Verdict {
        let device = Device::new("1", "Build Mac")
            .with_serial_number("C02XYZ")
            .with_user("Sam");
        DiskUsageCheck::new().evaluate(
            &Subject::device(&device).with_details(details),
            &EvaluationContext::now(),
        )
    }

    #[test]
    fn test_70_percent_violates() {
        let Verdict::Violations(found) = verdict(&details("70%")) else {
            panic!("expected violation");
        };
        assert_eq!(found[0].user, "Sam");
        assert_eq!(
            found[0].detail,
            ViolationDetail::DiskUsage {
                serial_number: "C02XYZ".to_string(),
                volume: "Macintosh HD".to_string(),
                capacity: "494.38 GB".to_string(),
                available: "120.1 GB".to_string(),
                percent_used: 70,
            }
        );
    }

    #[test]
    fn test_69_percent_passes() {
        assert_eq!(verdict(&details("69%")), Verdict::Compliant);
    }

    #[test]
    fn test_non_numeric_is_skipped() {
        assert_eq!(
            verdict(&details("abc%")),
            Verdict::Unparsable(ParseError::Percentage("abc%".to_string()))
        );
    }

    #[test]
    fn test_other_volumes_ignored() {
        let details: DeviceDetails =
            serde_json::from_str(r#"{"volumes": [{"name": "Data", "percent_used": "95%"}]}"#).unwrap();
        assert_eq!(verdict(&details), Verdict::NotApplicable);
    }

    #[test]
    fn test_assigned_user_from_details_wins() {
        let details: DeviceDetails = serde_json::from_str(
            r#"{"general": {"assigned_user": {"name": "Riley"}},
                "volumes": [{"name": "Macintosh HD", "percent_used": "88%"}]}"#,
        )
        .unwrap();
        let Verdict::Violations(found) = verdict(&details) else {
            panic!("expected violation");
        };
        assert_eq!(found[0].user, "Riley");
    }

    #[test]
    fn test_report_layout_counts_violations() {
        let check = DiskUsageCheck::new();
        let ctx = EvaluationContext::now();
        assert_eq!(
            check.report_layout(&[], &ctx).all_clear,
            "No volumes found with over 70% usage."
        );
    }
}
