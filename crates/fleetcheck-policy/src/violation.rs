//! Violation records

use chrono::{DateTime, Utc};
use fleetcheck_core::{Device, OsFamily, Platform};

/// One device's failure of one predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub device_id: String,
    pub device_name: String,
    pub platform: Platform,
    /// Display name of the user shown in the report
    pub user: String,
    pub detail: ViolationDetail,
}

impl Violation {
    /// Create a violation carrying the device's identity
    pub fn for_device(device: &Device, detail: ViolationDetail) -> Self {
        Self {
            device_id: device.device_id.clone(),
            device_name: device.device_name.clone(),
            platform: device.platform.clone(),
            user: device.user.clone(),
            detail,
        }
    }

    /// Override the user shown in the report
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }
}

/// Predicate-specific part of a violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationDetail {
    /// Device has not checked in within the allowed window
    Stale {
        last_check_in: DateTime<Utc>,
        hours_since: i64,
    },

    /// A managed library item is in the ERROR state
    PolicyError {
        item: String,
        /// Leading lines of the item's log
        log_excerpt: String,
    },

    /// The system volume is above the usage threshold
    DiskUsage {
        serial_number: String,
        volume: String,
        capacity: String,
        available: String,
        percent_used: u32,
    },

    /// Device runs an OS older than the latest release
    OutdatedOs {
        family: OsFamily,
        current: String,
        latest: String,
    },
}
