//! Runtime settings
//!
//! Built once at startup from, in precedence order: command-line flags,
//! environment variables, the optional YAML settings file, the file secret
//! store (credentials only), and defaults.

use chrono::Duration as ChronoDuration;
use fleetcheck_client::{
    FileSecretStore, SecretStore, DEFAULT_ICON_EMOJI, DEFAULT_IOS_FEED_URL,
    DEFAULT_MACOS_FEED_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USERNAME,
};
use fleetcheck_core::{Error, LatestOsReference, ParseError, Result};
use fleetcheck_policy::{DiskUsageCheck, OsCurrencyCheck, PolicyErrorCheck, StalenessCheck};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::cli::{CredentialArgs, BASE_URL_VAR, CHANNEL_VAR, TOKEN_VAR, WEBHOOK_VAR};

/// Optional YAML settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// MDM tenant base URL
    pub base_url: Option<String>,

    /// Chat channel id
    pub channel: Option<String>,

    /// Chat webhook URL
    pub webhook_url: Option<String>,

    /// Devices requested per inventory page
    pub page_size: Option<usize>,

    pub request_timeout_secs: Option<u64>,

    /// Display name of the notification sender
    pub username: Option<String>,

    pub icon_emoji: Option<String>,

    pub macos_feed_url: Option<String>,

    pub ios_feed_url: Option<String>,

    /// Path of a JSON file secret store
    pub secret_store: Option<PathBuf>,

    /// Per-check overrides
    pub checks: CheckSettings,
}

impl FileConfig {
    /// Load the settings file, or defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            Error::config(format!("invalid settings file {}: {}", path.display(), e))
        })
    }
}

/// The `checks` section of the settings file; absent keys keep each
/// check's defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckSettings {
    pub checkin: CheckinSettings,
    pub errors: ErrorsSettings,
    pub disk_usage: DiskUsageSettings,
    pub os_currency: OsCurrencySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckinSettings {
    /// Hours without a check-in before a device is reported
    pub max_age_hours: Option<u32>,
    pub exclusion_tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorsSettings {
    /// Log lines kept per failing library item
    pub log_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskUsageSettings {
    /// Percentage used above which a volume is reported
    pub threshold: Option<u32>,
    pub volume: Option<String>,
    pub exclusion_tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsCurrencySettings {
    pub exclusion_tag: Option<String>,
}

impl CheckSettings {
    pub fn staleness(&self) -> StalenessCheck {
        let mut check = StalenessCheck::new();
        if let Some(hours) = self.checkin.max_age_hours {
            check = check.with_max_age(ChronoDuration::hours(i64::from(hours)));
        }
        if let Some(tag) = &self.checkin.exclusion_tag {
            check = check.with_exclusion_tag(tag);
        }
        check
    }

    pub fn policy_errors(&self) -> PolicyErrorCheck {
        match self.errors.log_lines {
            Some(lines) => PolicyErrorCheck::new().with_log_lines(lines),
            None => PolicyErrorCheck::new(),
        }
    }

    pub fn disk_usage(&self) -> DiskUsageCheck {
        let settings = &self.disk_usage;
        let mut check = DiskUsageCheck::new();
        if let Some(threshold) = settings.threshold {
            check = check.with_threshold(threshold);
        }
        if let Some(volume) = &settings.volume {
            check = check.with_volume_name(volume);
        }
        if let Some(tag) = &settings.exclusion_tag {
            check = check.with_exclusion_tag(tag);
        }
        check
    }

    pub fn os_currency(
        &self,
        reference: LatestOsReference,
    ) -> std::result::Result<OsCurrencyCheck, ParseError> {
        let check = OsCurrencyCheck::new(reference)?;
        Ok(match &self.os_currency.exclusion_tag {
            Some(tag) => check.with_exclusion_tag(tag),
            None => check,
        })
    }
}

/// Where reports are posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub channel: String,
    pub webhook_url: String,
    pub username: String,
    pub icon_emoji: String,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_token: String,
    pub base_url: String,
    /// Absent only for dry runs
    pub notification: Option<NotificationSettings>,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub macos_feed_url: String,
    pub ios_feed_url: String,
    pub checks: CheckSettings,
}

impl Settings {
    /// Resolve settings, failing with every missing required value named.
    ///
    /// `env` is consulted after the flags and before the settings file; in
    /// the binary it is the process environment. The channel and webhook are
    /// only required when `require_notification` is set.
    pub fn resolve(
        args: &CredentialArgs,
        file: FileConfig,
        env: &dyn SecretStore,
        require_notification: bool,
    ) -> Result<Self> {
        let file_store = file.secret_store.as_deref().map(FileSecretStore::new);
        let sources = Sources {
            env,
            file_store: file_store.as_ref(),
        };

        let api_token = sources.lookup(TOKEN_VAR, args.api_token.as_deref(), None)?;
        let base_url =
            sources.lookup(BASE_URL_VAR, args.base_url.as_deref(), file.base_url.as_deref())?;
        let channel =
            sources.lookup(CHANNEL_VAR, args.channel.as_deref(), file.channel.as_deref())?;
        let webhook_url = sources.lookup(
            WEBHOOK_VAR,
            args.webhook_url.as_deref(),
            file.webhook_url.as_deref(),
        )?;

        let mut missing = Vec::new();
        if api_token.is_none() {
            missing.push(TOKEN_VAR);
        }
        if base_url.is_none() {
            missing.push(BASE_URL_VAR);
        }
        if require_notification {
            if channel.is_none() {
                missing.push(CHANNEL_VAR);
            }
            if webhook_url.is_none() {
                missing.push(WEBHOOK_VAR);
            }
        }

        let (api_token, base_url) = match (api_token, base_url) {
            (Some(token), Some(url)) if missing.is_empty() => (token, url),
            _ => return Err(missing_error(&missing)),
        };

        let notification = match (channel, webhook_url) {
            (Some(channel), Some(webhook_url)) if require_notification => {
                Some(NotificationSettings {
                    channel,
                    webhook_url,
                    username: file.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
                    icon_emoji: file
                        .icon_emoji
                        .unwrap_or_else(|| DEFAULT_ICON_EMOJI.to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            api_token,
            base_url,
            notification,
            page_size: file.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            macos_feed_url: file
                .macos_feed_url
                .unwrap_or_else(|| DEFAULT_MACOS_FEED_URL.to_string()),
            ios_feed_url: file
                .ios_feed_url
                .unwrap_or_else(|| DEFAULT_IOS_FEED_URL.to_string()),
            checks: file.checks,
        })
    }
}

/// Stores consulted for a value not given on the command line
struct Sources<'a> {
    env: &'a dyn SecretStore,
    file_store: Option<&'a FileSecretStore>,
}

impl Sources<'_> {
    /// First non-blank value of: flag, environment, settings file, file store
    fn lookup(
        &self,
        name: &str,
        flag: Option<&str>,
        setting: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(value) = non_blank(flag) {
            return Ok(Some(value));
        }
        if let Some(value) = non_blank(self.env.read(name)?.as_ref().map(|e| e.secret.as_str())) {
            return Ok(Some(value));
        }
        if let Some(value) = non_blank(setting) {
            return Ok(Some(value));
        }

        let Some(store) = self.file_store else {
            return Ok(None);
        };
        let value = non_blank(store.read(name)?.as_ref().map(|e| e.secret.as_str()));
        if value.is_some() {
            debug!(service = name, "Using credential from secret store");
        }
        Ok(value)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn missing_error(missing: &[&str]) -> Error {
    Error::config(format!(
        "Missing environment variables: {}",
        missing.join(", ")
    ))
}
