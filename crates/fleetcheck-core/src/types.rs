//! Device inventory types as read from the MDM API

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Display value used whenever a name-like field is missing
pub const UNKNOWN: &str = "Unknown";

/// One enrolled device from the inventory listing
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    /// Opaque identifier used for detail and status lookups
    #[serde(default, deserialize_with = "id_string")]
    pub device_id: String,

    /// Display name
    #[serde(default = "unknown", deserialize_with = "name_or_unknown")]
    pub device_name: String,

    /// Hardware platform
    #[serde(default)]
    pub platform: Platform,

    #[serde(default = "unknown", deserialize_with = "name_or_unknown")]
    pub serial_number: String,

    /// Raw last check-in timestamp; parsed by the predicates that need it
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_check_in: Option<String>,

    /// Free-form OS version string, possibly empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub os_version: String,

    /// Exclusion and grouping tags; non-string entries are dropped
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,

    /// Normalized display name of the assigned user
    #[serde(default = "unknown", deserialize_with = "user_display_name")]
    pub user: String,
}

impl Device {
    /// Create a device with the given id and name and every other field defaulted
    pub fn new(device_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            platform: Platform::default(),
            serial_number: unknown(),
            last_check_in: None,
            os_version: String::new(),
            tags: Vec::new(),
            user: unknown(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_last_check_in(mut self, last_check_in: impl Into<String>) -> Self {
        self.last_check_in = Some(last_check_in.into());
        self
    }

    pub fn with_os_version(mut self, os_version: impl Into<String>) -> Self {
        self.os_version = os_version.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = serial_number.into();
        self
    }

    /// Whether the device carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Device platform, matched case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Mac,
    IPhone,
    IPad,
    AppleTv,
    /// Any other platform, kept verbatim
    Other(String),
}

impl Platform {
    /// Parse a platform string as reported by the MDM
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mac" => Self::Mac,
            "iphone" => Self::IPhone,
            "ipad" => Self::IPad,
            "appletv" => Self::AppleTv,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// OS family for version comparison, if the platform has one we track
    pub fn os_family(&self) -> Option<OsFamily> {
        match self {
            Self::Mac => Some(OsFamily::MacOs),
            Self::IPhone | Self::IPad => Some(OsFamily::Ios),
            Self::AppleTv | Self::Other(_) => None,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::Other(UNKNOWN.to_string())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mac => f.write_str("Mac"),
            Self::IPhone => f.write_str("iPhone"),
            Self::IPad => f.write_str("iPad"),
            Self::AppleTv => f.write_str("AppleTV"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(raw) if !raw.trim().is_empty() => Self::parse(&raw),
            _ => Self::default(),
        })
    }
}

/// The `user` field: either a bare display name or a user object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    PlainName(String),
    NamedUser {
        #[serde(default)]
        name: Option<String>,
    },
    Unrecognized(IgnoredAny),
}

impl UserRef {
    /// Display name, if the value carries a non-empty one
    pub fn display_name(&self) -> Option<&str> {
        let name = match self {
            Self::PlainName(name) => name.as_str(),
            Self::NamedUser { name: Some(name) } => name.as_str(),
            Self::NamedUser { name: None } | Self::Unrecognized(_) => return None,
        };
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Response of `/devices/{id}/details`, reduced to what the checks read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDetails {
    #[serde(default)]
    pub general: Option<GeneralInfo>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<Volume>,
}

impl DeviceDetails {
    /// Assigned user recorded in the detail record
    pub fn assigned_user(&self) -> Option<&str> {
        self.general
            .as_ref()
            .and_then(|g| g.assigned_user.as_ref())
            .and_then(UserRef::display_name)
    }

    /// Volume with exactly the given name
    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes
            .iter()
            .find(|v| v.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralInfo {
    #[serde(default)]
    pub assigned_user: Option<UserRef>,
}

/// One storage volume of a device
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub name: Option<String>,

    /// Percentage string such as `"72%"`
    #[serde(default, deserialize_with = "lenient_string")]
    pub percent_used: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub capacity: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub available: Option<String>,
}

/// Response of `/devices/{id}/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub library_items: Vec<LibraryItem>,
}

/// Install/enforcement status of one managed library item
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryItem {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    #[serde(default)]
    pub log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemStatus {
    Pass,
    Error,
    Pending,
    Incompatible,
    Excluded,
    /// Any other status, kept verbatim
    Other(String),
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for ItemStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            None => Self::Unknown,
            Some("PASS") => Self::Pass,
            Some("ERROR") => Self::Error,
            Some("PENDING") => Self::Pending,
            Some("INCOMPATIBLE") => Self::Incompatible,
            Some("EXCLUDED") => Self::Excluded,
            Some(other) => Self::Other(other.to_string()),
        })
    }
}

/// OS family a device is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    #[serde(rename = "macOS")]
    MacOs,
    #[serde(rename = "iOS")]
    Ios,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => f.write_str("macOS"),
            Self::Ios => f.write_str("iOS"),
        }
    }
}

/// Latest published release of one OS family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsRelease {
    pub family: OsFamily,
    pub version: String,
    pub build: String,
    pub release_date: DateTime<Utc>,
    pub actively_exploited_cves: Vec<String>,
}

impl OsRelease {
    /// Whole days elapsed between the release and `now`
    pub fn days_since_release(&self, now: DateTime<Utc>) -> i64 {
        (now - self.release_date).num_days()
    }
}

/// Latest macOS and iOS releases, read once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestOsReference {
    pub macos: OsRelease,
    pub ios: OsRelease,
}

impl LatestOsReference {
    pub fn for_family(&self, family: OsFamily) -> &OsRelease {
        match family {
            OsFamily::MacOs => &self.macos,
            OsFamily::Ios => &self.ios,
        }
    }
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn name_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(unknown))
}

fn user_display_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let user = Option::<UserRef>::deserialize(deserializer)?;
    Ok(user
        .as_ref()
        .and_then(UserRef::display_name)
        .map(str::to_string)
        .unwrap_or_else(unknown))
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_defaults() {
        let device: Device = serde_json::from_str(r#"{"device_id": "abc"}"#).unwrap();
        assert_eq!(device.device_name, "Unknown");
        assert_eq!(device.serial_number, "Unknown");
        assert_eq!(device.user, "Unknown");
        assert_eq!(device.platform, Platform::Other("Unknown".to_string()));
        assert!(device.tags.is_empty());
        assert!(device.os_version.is_empty());
        assert!(device.last_check_in.is_none());
    }

    #[test]
    fn test_null_fields_fall_back() {
        let json = r#"{"device_id": "abc", "device_name": null, "tags": null, "user": null, "os_version": null}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_name, "Unknown");
        assert_eq!(device.user, "Unknown");
        assert!(device.tags.is_empty());
    }

    #[test]
    fn test_numeric_fields_read_as_strings() {
        let json = r#"{"device_id": 1042, "last_check_in": 1760875200, "tags": ["exclude_24", 7, null]}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_id, "1042");
        assert_eq!(device.last_check_in.as_deref(), Some("1760875200"));
        assert_eq!(device.tags, vec!["exclude_24"]);
    }

    #[test]
    fn test_user_plain_name() {
        let json = r#"{"device_id": "1", "user": "Jo Smith"}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.user, "Jo Smith");
    }

    #[test]
    fn test_user_object() {
        let json = r#"{"device_id": "1", "user": {"name": "Jo Smith", "email": "jo@example.com", "id": 7}}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.user, "Jo Smith");
    }

    #[test]
    fn test_user_empty_or_odd_shapes() {
        for user in [r#""""#, "{}", "[]", "42"] {
            let json = format!(r#"{{"device_id": "1", "user": {}}}"#, user);
            let device: Device = serde_json::from_str(&json).unwrap();
            assert_eq!(device.user, "Unknown", "user = {}", user);
        }
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!(Platform::parse("Mac"), Platform::Mac);
        assert_eq!(Platform::parse("iPhone"), Platform::IPhone);
        assert_eq!(Platform::parse("IPAD"), Platform::IPad);
        assert_eq!(Platform::parse("AppleTV"), Platform::AppleTv);
        assert_eq!(Platform::parse("Vision"), Platform::Other("Vision".to_string()));
        assert_eq!(Platform::IPad.to_string(), "iPad");
    }

    #[test]
    fn test_platform_families() {
        assert_eq!(Platform::Mac.os_family(), Some(OsFamily::MacOs));
        assert_eq!(Platform::IPhone.os_family(), Some(OsFamily::Ios));
        assert_eq!(Platform::IPad.os_family(), Some(OsFamily::Ios));
        assert_eq!(Platform::AppleTv.os_family(), None);
    }

    #[test]
    fn test_details_volume_lookup() {
        let json = r#"{
            "general": {"assigned_user": {"name": "Ana"}},
            "volumes": [
                {"name": "Data", "percent_used": "91%"},
                {"name": "Macintosh HD", "percent_used": "72%", "capacity": "494.38 GB", "available": 120}
            ]
        }"#;
        let details: DeviceDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.assigned_user(), Some("Ana"));

        let volume = details.volume("Macintosh HD").unwrap();
        assert_eq!(volume.percent_used.as_deref(), Some("72%"));
        assert_eq!(volume.available.as_deref(), Some("120"));
        assert!(details.volume("macintosh hd").is_none());
    }

    #[test]
    fn test_library_item_status() {
        let json = r#"{"library_items": [
            {"name": "Chrome", "status": "ERROR", "log": "boom"},
            {"name": "Zoom", "status": "PASS"},
            {"name": "Slack", "status": "DOWNLOADING"},
            {"name": "VPN"}
        ]}"#;
        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        let statuses: Vec<_> = status.library_items.iter().map(|i| i.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Error,
                ItemStatus::Pass,
                ItemStatus::Other("DOWNLOADING".to_string()),
                ItemStatus::Unknown,
            ]
        );
    }
}
