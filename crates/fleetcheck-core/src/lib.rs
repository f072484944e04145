//! FleetCheck Core
//!
//! Core types and utilities shared across FleetCheck components.
//!
//! This crate provides:
//! - The device inventory model as read from the MDM API
//! - Latest-OS reference data
//! - Error types and result handling
//! - Collaborator traits for the inventory, release feeds, and notifications
//! - Parsing helpers for timestamps, percentages, and OS versions

pub mod error;
pub mod parse;
pub mod source;
pub mod types;
pub mod version;

pub use error::{Error, ParseError, Result};
pub use parse::{parse_percentage, parse_timestamp};
pub use source::{InventorySource, Notifier, ReleaseFeed};
pub use types::{
    Device, DeviceDetails, DeviceStatus, ItemStatus, LatestOsReference, LibraryItem, OsFamily,
    OsRelease, Platform, UserRef, Volume, UNKNOWN,
};
pub use version::Version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, ParseError, Result};
    pub use crate::source::{InventorySource, Notifier, ReleaseFeed};
    pub use crate::types::{Device, DeviceDetails, DeviceStatus, LatestOsReference, Platform};
    pub use crate::version::Version;
}
