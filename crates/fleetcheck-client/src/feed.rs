//! Latest OS release feeds
//!
//! Reads the SOFA-style JSON feeds. Only the newest entry is used:
//! `OSVersions[0].Latest`.

use async_trait::async_trait;
use fleetcheck_core::{
    parse_timestamp, Error, LatestOsReference, OsFamily, OsRelease, ReleaseFeed, Result, Version,
    UNKNOWN,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Public macOS feed
pub const DEFAULT_MACOS_FEED_URL: &str = "https://sofafeed.macadmins.io/v1/macos_data_feed.json";

/// Public iOS feed
pub const DEFAULT_IOS_FEED_URL: &str = "https://sofafeed.macadmins.io/v1/ios_data_feed.json";

// ============================================================================
// Feed document
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(rename = "OSVersions", default)]
    os_versions: Vec<FeedOsVersion>,
}

#[derive(Debug, Deserialize)]
struct FeedOsVersion {
    #[serde(rename = "Latest")]
    latest: FeedLatest,
}

#[derive(Debug, Deserialize)]
struct FeedLatest {
    #[serde(rename = "ProductVersion")]
    product_version: String,
    #[serde(rename = "Build", default)]
    build: Option<String>,
    #[serde(rename = "ReleaseDate")]
    release_date: String,
    #[serde(rename = "ActivelyExploitedCVEs", default)]
    actively_exploited_cves: Option<Vec<String>>,
}

/// Extract the latest release of `family` from a feed document
pub fn parse_feed(family: OsFamily, body: &str) -> Result<OsRelease> {
    let context = format!("{} release feed", family);

    let document: FeedDocument = serde_json::from_str(body)
        .map_err(|e| Error::fetch(&context, format!("invalid feed document: {}", e)))?;

    let latest = document
        .os_versions
        .into_iter()
        .next()
        .map(|entry| entry.latest)
        .ok_or_else(|| Error::fetch(&context, "feed lists no OS versions"))?;

    // The reference version must be comparable, or every device would be skipped
    Version::parse(&latest.product_version).map_err(|e| Error::fetch(&context, e.to_string()))?;
    let release_date =
        parse_timestamp(&latest.release_date).map_err(|e| Error::fetch(&context, e.to_string()))?;

    Ok(OsRelease {
        family,
        version: latest.product_version,
        build: latest.build.unwrap_or_else(|| UNKNOWN.to_string()),
        release_date,
        actively_exploited_cves: latest.actively_exploited_cves.unwrap_or_default(),
    })
}

// ============================================================================
// HTTP feed
// ============================================================================

/// Release feed served over HTTP, one URL per OS family
#[derive(Debug, Clone)]
pub struct SofaFeed {
    http: reqwest::Client,
    macos_url: String,
    ios_url: String,
}

impl SofaFeed {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            macos_url: DEFAULT_MACOS_FEED_URL.to_string(),
            ios_url: DEFAULT_IOS_FEED_URL.to_string(),
        }
    }

    pub fn with_macos_url(mut self, url: impl Into<String>) -> Self {
        self.macos_url = url.into();
        self
    }

    pub fn with_ios_url(mut self, url: impl Into<String>) -> Self {
        self.ios_url = url.into();
        self
    }

    fn url_for(&self, family: OsFamily) -> &str {
        match family {
            OsFamily::MacOs => &self.macos_url,
            OsFamily::Ios => &self.ios_url,
        }
    }
}

#[async_trait]
impl ReleaseFeed for SofaFeed {
    async fn fetch_latest(&self, family: OsFamily) -> Result<OsRelease> {
        let context = format!("{} release feed", family);
        let url = self.url_for(family);
        debug!(%url, "GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(&context, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_status(&context, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(&context, e.to_string()))?;

        let release = parse_feed(family, &body)?;
        info!(%family, version = %release.version, build = %release.build, "Fetched latest release");
        Ok(release)
    }
}

/// Read both families' latest releases, macOS first
pub async fn fetch_reference(feed: &dyn ReleaseFeed) -> Result<LatestOsReference> {
    let macos = feed.fetch_latest(OsFamily::MacOs).await?;
    let ios = feed.fetch_latest(OsFamily::Ios).await?;
    Ok(LatestOsReference { macos, ios })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const MACOS_FEED: &str = r#"{
        "UpdateHash": "abc",
        "OSVersions": [
            {
                "OSVersion": "Sequoia 15",
                "Latest": {
                    "ProductVersion": "15.1",
                    "Build": "24B83",
                    "ReleaseDate": "2026-10-01T17:00:00Z",
                    "ActivelyExploitedCVEs": ["CVE-2026-0001"]
                }
            },
            {
                "OSVersion": "Sonoma 14",
                "Latest": {
                    "ProductVersion": "14.7.1",
                    "Build": "23H222",
                    "ReleaseDate": "2026-09-20T17:00:00Z",
                    "ActivelyExploitedCVEs": []
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_first_entry_only() {
        let release = parse_feed(OsFamily::MacOs, MACOS_FEED).unwrap();
        assert_eq!(release.family, OsFamily::MacOs);
        assert_eq!(release.version, "15.1");
        assert_eq!(release.build, "24B83");
        assert_eq!(
            release.release_date,
            Utc.with_ymd_and_hms(2026, 10, 1, 17, 0, 0).unwrap()
        );
        assert_eq!(release.actively_exploited_cves, vec!["CVE-2026-0001"]);
    }

    #[test]
    fn test_missing_optional_fields() {
        let body = r#"{"OSVersions": [{"Latest": {"ProductVersion": "18.1", "ReleaseDate": "2026-10-09T17:00:00Z", "ActivelyExploitedCVEs": null}}]}"#;
        let release = parse_feed(OsFamily::Ios, body).unwrap();
        assert_eq!(release.build, "Unknown");
        assert!(release.actively_exploited_cves.is_empty());
    }

    #[test]
    fn test_malformed_feeds_are_fetch_errors() {
        let cases = [
            "not json",
            r#"{"OSVersions": []}"#,
            r#"{"OSVersions": [{"Latest": {"ProductVersion": "soon", "ReleaseDate": "2026-10-09"}}]}"#,
            r#"{"OSVersions": [{"Latest": {"ProductVersion": "18.1", "ReleaseDate": "yesterday"}}]}"#,
        ];

        for body in cases {
            let err = parse_feed(OsFamily::Ios, body).unwrap_err();
            assert!(err.is_fetch(), "{:?} should fail as a fetch error", body);
        }
    }
}
