//! FleetCheck Client
//!
//! Network and storage collaborators for the compliance pipeline:
//! - `MdmClient`: paginated device inventory and per-device records
//! - `SofaFeed`: latest macOS and iOS releases
//! - `SlackNotifier`: report delivery through a chat webhook
//! - Secret stores with age-based rotation

pub mod feed;
pub mod mdm;
pub mod notify;
pub mod secret;

pub use feed::{fetch_reference, parse_feed, SofaFeed, DEFAULT_IOS_FEED_URL, DEFAULT_MACOS_FEED_URL};
pub use mdm::{MdmClient, DEFAULT_PAGE_SIZE};
pub use notify::{SlackNotifier, DEFAULT_ICON_EMOJI, DEFAULT_USERNAME};
pub use secret::{
    store_with_rotation, EnvSecretStore, FileSecretStore, RotationOutcome, SecretEntry,
    SecretStore, DEFAULT_ROTATION_DAYS,
};

use fleetcheck_core::{Error, Result};
use std::time::Duration;

/// Request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the shared HTTP client
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fleetcheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}
