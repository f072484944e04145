//! Report rendering
//!
//! Renders a violation list into the single text message posted for a run.
//! Rendering is a pure function of its inputs; violations keep inventory order.

use crate::violation::{Violation, ViolationDetail};

/// Fixed text surrounding the violation blocks of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    /// Text rendered before everything else, followed by a blank line
    pub preamble: Option<String>,

    /// Line introducing the violation blocks
    pub header: String,

    /// Message used when there are no violations
    pub all_clear: String,

    /// Keep the header above the all-clear sentence when there are no violations
    pub header_when_clear: bool,
}

impl ReportLayout {
    pub fn new(header: impl Into<String>, all_clear: impl Into<String>) -> Self {
        Self {
            preamble: None,
            header: header.into(),
            all_clear: all_clear.into(),
            header_when_clear: false,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn with_header_when_clear(mut self) -> Self {
        self.header_when_clear = true;
        self
    }
}

/// Render violations into one message.
///
/// With no violations and no preamble the result is exactly the all-clear
/// sentence. Otherwise the header is followed by one block per violation,
/// blocks separated by a blank line.
pub fn format_report(violations: &[Violation], layout: &ReportLayout) -> String {
    let mut sections = Vec::with_capacity(2);

    if let Some(preamble) = &layout.preamble {
        sections.push(preamble.clone());
    }

    if violations.is_empty() {
        if layout.header_when_clear {
            sections.push(format!("{}\n{}", layout.header, layout.all_clear));
        } else {
            sections.push(layout.all_clear.clone());
        }
    } else {
        let blocks: Vec<String> = violations.iter().map(render_block).collect();
        sections.push(format!("{}\n{}", layout.header, blocks.join("\n\n")));
    }

    sections.join("\n\n")
}

/// Render the block for a single violation
pub fn render_block(violation: &Violation) -> String {
    match &violation.detail {
        ViolationDetail::Stale {
            last_check_in,
            hours_since,
        } => format!(
            "Device Name: {}\nPlatform: {}\nUser: {}\nLast Check-In: {} ({}h ago)",
            violation.device_name,
            violation.platform,
            violation.user,
            last_check_in.format("%Y-%m-%d %H:%M UTC"),
            hours_since
        ),

        ViolationDetail::PolicyError { item, log_excerpt } => format!(
            "Device: {}\nItem: {}\nError Log: {}",
            violation.device_name, item, log_excerpt
        ),

        ViolationDetail::DiskUsage {
            serial_number,
            volume,
            capacity,
            available,
            percent_used,
        } => format!(
            "Device Name: {}, Serial: {}, Assigned User: {}, Volume: {}, Used: {}%, Capacity: {}, Available: {}",
            violation.device_name,
            serial_number,
            violation.user,
            volume,
            percent_used,
            capacity,
            available
        ),

        ViolationDetail::OutdatedOs {
            current, latest, ..
        } => format!(
            "{} ({}, User: {}): {} (Latest: {})",
            violation.device_name, violation.platform, violation.user, current, latest
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fleetcheck_core::{Device, OsFamily, Platform};

    fn stale(name: &str) -> Violation {
        let device = Device::new(name, name)
            .with_platform(Platform::Mac)
            .with_user("Jo");
        Violation::for_device(
            &device,
            ViolationDetail::Stale {
                last_check_in: chrono::Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap(),
                hours_since: 30,
            },
        )
    }

    #[test]
    fn test_empty_is_exactly_all_clear() {
        let layout = ReportLayout::new("Header:", "All good.");
        assert_eq!(format_report(&[], &layout), "All good.");
    }

    #[test]
    fn test_empty_with_header_and_preamble() {
        let layout = ReportLayout::new("Header:", "All good.")
            .with_preamble("Intro")
            .with_header_when_clear();
        assert_eq!(format_report(&[], &layout), "Intro\n\nHeader:\nAll good.");
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let layout = ReportLayout::new("Stale devices:", "All good.");
        let message = format_report(&[stale("A"), stale("B")], &layout);

        assert_eq!(
            message,
            "Stale devices:\n\
             Device Name: A\nPlatform: Mac\nUser: Jo\nLast Check-In: 2026-10-17 08:00 UTC (30h ago)\n\n\
             Device Name: B\nPlatform: Mac\nUser: Jo\nLast Check-In: 2026-10-17 08:00 UTC (30h ago)"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let layout = ReportLayout::new("Stale devices:", "All good.").with_preamble("Intro");
        let violations = vec![stale("A"), stale("B"), stale("C")];

        let first = format_report(&violations, &layout);
        let second = format_report(&violations.clone(), &layout.clone());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_outdated_os_block() {
        let device = Device::new("1", "Ana's iPad")
            .with_platform(Platform::IPad)
            .with_user("Ana");
        let violation = Violation::for_device(
            &device,
            ViolationDetail::OutdatedOs {
                family: OsFamily::Ios,
                current: "17.6".to_string(),
                latest: "18.1".to_string(),
            },
        );
        assert_eq!(
            render_block(&violation),
            "Ana's iPad (iPad, User: Ana): 17.6 (Latest: 18.1)"
        );
    }
}
