//! OS currency against the latest published releases

use fleetcheck_core::{LatestOsReference, OsFamily, OsRelease, ParseError, Version};
use std::fmt::Write;

use crate::predicate::{EvaluationContext, Predicate, Subject, Verdict};
use crate::report::ReportLayout;
use crate::violation::{Violation, ViolationDetail};

/// Default exclusion tag for the OS currency check
pub const EXCLUDE_OS_TAG: &str = "exclude_os_check";

/// Flags Macs, iPhones, and iPads running an OS older than the latest release.
///
/// Every other platform, including Apple TV, is not applicable. Versions are
/// ordered numerically per segment, so `14.9` is older than `14.10`.
#[derive(Debug, Clone)]
pub struct OsCurrencyCheck {
    reference: LatestOsReference,
    latest_macos: Version,
    latest_ios: Version,
    exclusion_tag: String,
}

impl OsCurrencyCheck {
    /// Build the check from reference data; fails if a latest version is unparsable
    pub fn new(reference: LatestOsReference) -> Result<Self, ParseError> {
        let latest_macos = Version::parse(&reference.macos.version)?;
        let latest_ios = Version::parse(&reference.ios.version)?;

        Ok(Self {
            reference,
            latest_macos,
            latest_ios,
            exclusion_tag: EXCLUDE_OS_TAG.to_string(),
        })
    }

    pub fn with_exclusion_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclusion_tag = tag.into();
        self
    }

    pub fn reference(&self) -> &LatestOsReference {
        &self.reference
    }

    /// Summary of both reference releases placed above the device list
    pub fn preamble(&self, ctx: &EvaluationContext) -> String {
        format!(
            "Latest OS Versions:\n{}\n\n{}",
            release_summary(&self.reference.macos, ctx),
            release_summary(&self.reference.ios, ctx)
        )
    }
}

fn release_summary(release: &OsRelease, ctx: &EvaluationContext) -> String {
    let exploits = if release.actively_exploited_cves.is_empty() {
        "None".to_string()
    } else {
        release.actively_exploited_cves.join(", ")
    };

    let mut text = String::new();
    let _ = writeln!(text, "{}:", release.family);
    let _ = writeln!(text, "  Version: {}", release.version);
    let _ = writeln!(text, "  Build: {}", release.build);
    let _ = writeln!(
        text,
        "  Release Date: {}",
        release.release_date.format("%B %d, %Y")
    );
    let _ = writeln!(
        text,
        "  Days Since Release: {}",
        release.days_since_release(ctx.now)
    );
    let _ = write!(text, "  Zero Day Exploits: {}", exploits);
    text
}

impl Predicate for OsCurrencyCheck {
    fn name(&self) -> &str {
        "os-currency"
    }

    fn exclusion_tag(&self) -> Option<&str> {
        Some(&self.exclusion_tag)
    }

    fn evaluate(&self, subject: &Subject<'_>, _ctx: &EvaluationContext) -> Verdict {
        let device = subject.device;

        let Some(family) = device.platform.os_family() else {
            return Verdict::NotApplicable;
        };

        let raw = device.os_version.trim();
        if raw.is_empty() {
            return Verdict::NotApplicable;
        }

        let current = match Version::parse(raw) {
            Ok(version) => version,
            Err(err) => return Verdict::Unparsable(err),
        };

        let (latest, release) = match family {
            OsFamily::MacOs => (&self.latest_macos, &self.reference.macos),
            OsFamily::Ios => (&self.latest_ios, &self.reference.ios),
        };

        if current >= *latest {
            return Verdict::Compliant;
        }

        Verdict::violation(Violation::for_device(
            device,
            ViolationDetail::OutdatedOs {
                family,
                current: raw.to_string(),
                latest: release.version.clone(),
            },
        ))
    }

    fn report_layout(&self, _violations: &[Violation], ctx: &EvaluationContext) -> ReportLayout {
        ReportLayout::new(
            "Devices not running the latest OS:",
            "All devices are up to date with the latest OS versions.",
        )
        .with_preamble(self.preamble(ctx))
        .with_header_when_clear()
    }
}
