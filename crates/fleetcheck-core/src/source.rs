//! Collaborator traits
//!
//! The evaluation pipeline talks to the MDM backend, the release feeds, and
//! the chat webhook only through these traits, so each can be replaced by a
//! test double.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Device, DeviceDetails, DeviceStatus, OsFamily, OsRelease};

/// Source of the device inventory and per-device detail records
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Fetch every enrolled device
    async fn fetch_inventory(&self) -> Result<Vec<Device>>;

    /// Fetch the detail record (volumes, assigned user) of one device
    async fn fetch_device_details(&self, device_id: &str) -> Result<DeviceDetails>;

    /// Fetch the library item status of one device
    async fn fetch_device_status(&self, device_id: &str) -> Result<DeviceStatus>;
}

/// Source of the latest published OS releases
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    async fn fetch_latest(&self, family: OsFamily) -> Result<OsRelease>;
}

/// Delivery channel for the rendered report
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a message; never retried
    async fn notify(&self, message: &str) -> Result<()>;
}
