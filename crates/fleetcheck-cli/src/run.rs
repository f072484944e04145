//! One check run: fetch, evaluate, render, deliver

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetcheck_client::{fetch_reference, http_client, MdmClient, SlackNotifier, SofaFeed};
use fleetcheck_core::{Error, InventorySource, Notifier, ReleaseFeed, Result};
use fleetcheck_policy::{ComplianceEngine, EvaluationContext, Predicate, Violation};
use fleetcheck_telemetry::RunSnapshot;
use std::fmt;
use tracing::{error, info};

use crate::config::{CheckSettings, Settings};

/// Process exit status of a successful run
pub const EXIT_OK: u8 = 0;
/// Missing or invalid configuration
pub const EXIT_CONFIG: u8 = 1;
/// Inventory or release feed could not be fetched
pub const EXIT_FETCH: u8 = 2;
/// Report could not be delivered
pub const EXIT_DELIVERY: u8 = 3;

/// The compliance checks the binary can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Checkin,
    Errors,
    DiskUsage,
    OsCurrency,
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Errors => "errors",
            Self::DiskUsage => "disk-usage",
            Self::OsCurrency => "os-currency",
        }
    }

    /// Whether a failed delivery fails the run
    pub fn delivery_is_fatal(&self) -> bool {
        matches!(self, Self::Checkin)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes reports to stdout instead of posting them
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        println!("{}", message);
        Ok(())
    }
}

/// External services a run talks to
pub struct Collaborators {
    pub inventory: Box<dyn InventorySource>,
    pub feed: Box<dyn ReleaseFeed>,
    pub notifier: Box<dyn Notifier>,
}

impl Collaborators {
    /// Build the HTTP-backed collaborators; dry runs print instead of posting
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = http_client(settings.request_timeout)?;

        let inventory = MdmClient::new(http.clone(), &settings.base_url, &settings.api_token)?
            .with_page_size(settings.page_size);

        let feed = SofaFeed::new(http.clone())
            .with_macos_url(&settings.macos_feed_url)
            .with_ios_url(&settings.ios_feed_url);

        let notifier: Box<dyn Notifier> = match &settings.notification {
            Some(target) => Box::new(
                SlackNotifier::new(http, &target.webhook_url, &target.channel)
                    .with_username(&target.username)
                    .with_icon_emoji(&target.icon_emoji),
            ),
            None => Box::new(ConsoleNotifier),
        };

        Ok(Self {
            inventory: Box::new(inventory),
            feed: Box::new(feed),
            notifier,
        })
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub check: CheckKind,
    pub violations: Vec<Violation>,
    pub message: String,
    pub metrics: RunSnapshot,
    pub delivered: bool,
}

async fn build_predicate(
    kind: CheckKind,
    checks: &CheckSettings,
    feed: &dyn ReleaseFeed,
) -> Result<Box<dyn Predicate>> {
    let predicate: Box<dyn Predicate> = match kind {
        CheckKind::Checkin => Box::new(checks.staleness()),
        CheckKind::Errors => Box::new(checks.policy_errors()),
        CheckKind::DiskUsage => Box::new(checks.disk_usage()),
        CheckKind::OsCurrency => {
            let reference = fetch_reference(feed).await?;
            Box::new(checks.os_currency(reference)?)
        }
    };
    Ok(predicate)
}

/// Run one check end to end.
///
/// Fails only when the inventory or release feed cannot be fetched, or when
/// delivery fails for a check whose delivery is fatal.
pub async fn run_check(
    kind: CheckKind,
    checks: &CheckSettings,
    collaborators: &Collaborators,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    info!(check = %kind, "Starting check");
    let ctx = EvaluationContext::new(now);

    let predicate = build_predicate(kind, checks, collaborators.feed.as_ref()).await?;
    let engine = ComplianceEngine::from_boxed(predicate);

    let inventory = collaborators.inventory.fetch_inventory().await?;
    let violations = engine
        .evaluate(&inventory, collaborators.inventory.as_ref(), &ctx)
        .await;
    engine.metrics().log_summary();

    let message = engine.render(&violations, &ctx);

    let delivered = match collaborators.notifier.notify(&message).await {
        Ok(()) => true,
        Err(e) if kind.delivery_is_fatal() => return Err(e),
        Err(e) => {
            error!(check = %kind, error = %e, "Failed to send notification");
            false
        }
    };

    Ok(RunReport {
        check: kind,
        violations,
        message,
        metrics: engine.metrics().snapshot(),
        delivered,
    })
}

/// Exit status for a failed run
pub fn exit_code(err: &Error) -> u8 {
    match err {
        Error::Config(_) | Error::Secret(_) | Error::Io(_) | Error::Serialization(_) => {
            EXIT_CONFIG
        }
        Error::Fetch { .. } | Error::Parse(_) => EXIT_FETCH,
        Error::Delivery { .. } => EXIT_DELIVERY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcheck_core::ParseError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Error::config("missing")), EXIT_CONFIG);
        assert_eq!(exit_code(&Error::secret("locked")), EXIT_CONFIG);
        assert_eq!(exit_code(&Error::fetch_status("devices", 503)), EXIT_FETCH);
        assert_eq!(
            exit_code(&Error::Parse(ParseError::Version("x".to_string()))),
            EXIT_FETCH
        );
        assert_eq!(exit_code(&Error::delivery(Some(500), "down")), EXIT_DELIVERY);
    }

    #[test]
    fn test_only_checkin_delivery_is_fatal() {
        assert!(CheckKind::Checkin.delivery_is_fatal());
        assert!(!CheckKind::Errors.delivery_is_fatal());
        assert!(!CheckKind::DiskUsage.delivery_is_fatal());
        assert!(!CheckKind::OsCurrency.delivery_is_fatal());
    }
}
