//! Check-in staleness

use chrono::Duration;
use fleetcheck_core::parse_timestamp;

use crate::predicate::{EvaluationContext, Predicate, Subject, Verdict};
use crate::report::ReportLayout;
use crate::violation::{Violation, ViolationDetail};

/// Default exclusion tag for the staleness check
pub const EXCLUDE_STALE_TAG: &str = "exclude_24";

/// Flags devices whose last check-in is older than the allowed window.
///
/// The comparison is strict: a device that checked in exactly `max_age` ago
/// passes. Unparsable or missing timestamps pass as well and are reported as
/// [`Verdict::Unparsable`].
#[derive(Debug, Clone)]
pub struct StalenessCheck {
    max_age: Duration,
    exclusion_tag: String,
}

impl StalenessCheck {
    pub fn new() -> Self {
        Self {
            max_age: Duration::hours(24),
            exclusion_tag: EXCLUDE_STALE_TAG.to_string(),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_exclusion_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclusion_tag = tag.into();
        self
    }
}

impl Default for StalenessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate for StalenessCheck {
    fn name(&self) -> &str {
        "checkin"
    }

    fn exclusion_tag(&self) -> Option<&str> {
        Some(&self.exclusion_tag)
    }

    fn evaluate(&self, subject: &Subject<'_>, ctx: &EvaluationContext) -> Verdict {
        let device = subject.device;
        let raw = device.last_check_in.as_deref().unwrap_or("");

        let last_check_in = match parse_timestamp(raw) {
            Ok(ts) => ts,
            Err(err) => return Verdict::Unparsable(err),
        };

        let elapsed = ctx.now - last_check_in;
        if elapsed <= self.max_age {
            return Verdict::Compliant;
        }

        Verdict::violation(Violation::for_device(
            device,
            ViolationDetail::Stale {
                last_check_in,
                hours_since: elapsed.num_hours(),
            },
        ))
    }

    fn report_layout(&self, _violations: &[Violation], _ctx: &EvaluationContext) -> ReportLayout {
        let hours = self.max_age.num_hours();
        ReportLayout::new(
            format!("These devices have not checked in for more than {} hours:", hours),
            format!("All devices have checked in over the last {} hours.", hours),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
    use fleetcheck_core::{Device, ParseError};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn checked_in(hours_ago: i64) -> Device {
        let ts = now() - Duration::hours(hours_ago);
        Device::new("1", "A").with_last_check_in(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn verdict(device: &Device) -> Verdict {
        StalenessCheck::new().evaluate(&Subject::device(device), &EvaluationContext::new(now()))
    }

    #[test]
    fn test_25_hours_violates() {
        match verdict(&checked_in(25)) {
            Verdict::Violations(v) => {
                assert_eq!(v.len(), 1);
                assert!(matches!(
                    v[0].detail,
                    ViolationDetail::Stale { hours_since: 25, .. }
                ));
            }
            other => panic!("expected violation, got {:?}", other),
        }
    }

    #[test]
    fn test_23_hours_passes() {
        assert_eq!(verdict(&checked_in(23)), Verdict::Compliant);
    }

    #[test]
    fn test_exactly_24_hours_passes() {
        assert_eq!(verdict(&checked_in(24)), Verdict::Compliant);
    }

    #[test]
    fn test_just_over_24_hours_violates() {
        let ts = now() - Duration::hours(24) - Duration::seconds(1);
        let device = Device::new("1", "A").with_last_check_in(ts.to_rfc3339());
        assert!(verdict(&device).is_violation());
    }

    #[test]
    fn test_naive_zulu_timestamp() {
        let device = Device::new("1", "A").with_last_check_in("2026-10-17T12:00:00.000000Z");
        assert!(verdict(&device).is_violation());
    }

    #[test]
    fn test_malformed_timestamp_fails_closed() {
        let device = Device::new("1", "A").with_last_check_in("not a date");
        assert_eq!(
            verdict(&device),
            Verdict::Unparsable(ParseError::Timestamp("not a date".to_string()))
        );
    }

    #[test]
    fn test_missing_timestamp_is_unparsable() {
        let device = Device::new("1", "A");
        assert!(matches!(verdict(&device), Verdict::Unparsable(_)));
    }

    #[test]
    fn test_custom_window() {
        let check = StalenessCheck::new().with_max_age(Duration::hours(72));
        let ctx = EvaluationContext::new(now());
        let device = checked_in(48);
        assert_eq!(check.evaluate(&Subject::device(&device), &ctx), Verdict::Compliant);

        let layout = check.report_layout(&[], &ctx);
        assert_eq!(layout.all_clear, "All devices have checked in over the last 72 hours.");
    }
}
