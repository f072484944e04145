//! MDM inventory client
//!
//! Talks to the Kandji-style REST API:
//! ```text
//! GET /api/v1/devices?limit=<N>&offset=<M>
//! GET /api/v1/devices/{id}/details
//! GET /api/v1/devices/{id}/status
//! ```
//! All requests carry a bearer token.

use async_trait::async_trait;
use fleetcheck_core::{Device, DeviceDetails, DeviceStatus, Error, InventorySource, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 300;

const DEVICES_PATH: &str = "api/v1/devices";

/// HTTP inventory source for the MDM API
#[derive(Debug, Clone)]
pub struct MdmClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    page_size: usize,
}

impl MdmClient {
    /// Create a client for the given tenant URL and API token
    pub fn new(http: reqwest::Client, base_url: &str, token: impl Into<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid MDM base URL {:?}: {}", base_url, e)))?;

        // Url::join replaces the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            token: token.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the number of devices requested per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("invalid MDM endpoint {:?}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::fetch(context, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_status(context, status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::fetch(context, format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl InventorySource for MdmClient {
    /// Fetch every device, one page at a time, until an empty page.
    ///
    /// The offset advances by the number of records actually returned, so a
    /// server that caps the page below `page_size` is still read in full.
    /// Paging also stops when a page brings no device not already seen.
    /// Malformed records are skipped one by one.
    async fn fetch_inventory(&self) -> Result<Vec<Device>> {
        let mut devices = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0usize;

        loop {
            let query = [
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            let page: Vec<Value> = self.get_json(DEVICES_PATH, &query, "devices").await?;
            let count = page.len();
            debug!(offset, count, "Fetched inventory page");

            if count == 0 {
                break;
            }

            let mut added = 0usize;
            for record in page {
                let key = record_key(&record);
                if !seen.insert(key) {
                    continue;
                }
                added += 1;

                match serde_json::from_value::<Device>(record) {
                    Ok(device) => devices.push(device),
                    Err(e) => warn!(offset, error = %e, "Skipping malformed inventory record"),
                }
            }

            if added == 0 {
                warn!(
                    offset,
                    count,
                    "Inventory page repeated earlier records, stopping pagination"
                );
                break;
            }
            offset += count;
        }

        info!(devices = devices.len(), "Fetched inventory");
        Ok(devices)
    }

    async fn fetch_device_details(&self, device_id: &str) -> Result<DeviceDetails> {
        let path = format!("{}/{}/details", DEVICES_PATH, device_id);
        self.get_json(&path, &[], &format!("device {} details", device_id))
            .await
    }

    async fn fetch_device_status(&self, device_id: &str) -> Result<DeviceStatus> {
        let path = format!("{}/{}/status", DEVICES_PATH, device_id);
        self.get_json(&path, &[], &format!("device {} status", device_id))
            .await
    }
}

/// Identity of an inventory record for repeat detection
fn record_key(record: &Value) -> String {
    match record.get("device_id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => record.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = MdmClient::new(reqwest::Client::new(), "https://acme.api.kandji.io", "t").unwrap();
        assert_eq!(
            client.endpoint(DEVICES_PATH).unwrap().as_str(),
            "https://acme.api.kandji.io/api/v1/devices"
        );

        let client = MdmClient::new(reqwest::Client::new(), "http://127.0.0.1:8080/proxy", "t").unwrap();
        assert_eq!(
            client.endpoint("api/v1/devices/42/status").unwrap().as_str(),
            "http://127.0.0.1:8080/proxy/api/v1/devices/42/status"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = MdmClient::new(reqwest::Client::new(), "not a url", "t").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key(&serde_json::json!({"device_id": "abc"})), "abc");
        assert_eq!(record_key(&serde_json::json!({"device_id": 42})), "42");
        assert_eq!(record_key(&serde_json::json!("garbage")), "\"garbage\"");
    }

    #[test]
    fn test_page_size_never_zero() {
        let client = MdmClient::new(reqwest::Client::new(), "https://acme.example", "t")
            .unwrap()
            .with_page_size(0);
        assert_eq!(client.page_size, 1);
    }
}
