//! FleetCheck CLI
//!
//! Runs one compliance check against the MDM inventory and posts the report
//! to the chat webhook.
//!
//! Exit status: `0` success, `1` missing or invalid configuration,
//! `2` inventory or release feed unavailable, `3` checkin report not delivered.

pub mod cli;
pub mod config;
pub mod run;

pub use cli::{CheckArgs, Cli, Command, CredentialArgs, SecretCommand};
pub use config::{
    CheckSettings, CheckinSettings, DiskUsageSettings, ErrorsSettings, FileConfig,
    NotificationSettings, OsCurrencySettings, Settings,
};
pub use run::{
    exit_code, run_check, CheckKind, Collaborators, ConsoleNotifier, RunReport, EXIT_CONFIG,
    EXIT_DELIVERY, EXIT_FETCH, EXIT_OK,
};

use anyhow::Context;
use chrono::{Duration, Utc};
use fleetcheck_client::{
    store_with_rotation, EnvSecretStore, FileSecretStore, DEFAULT_ROTATION_DAYS,
};
use fleetcheck_core::Error;
use std::io::Read;
use tracing::info;

/// Execute the parsed command line
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let file = FileConfig::load(&cli.config)?;

    let (kind, args) = match cli.command {
        Command::Secret { action } => return execute_secret(action, file),
        Command::Checkin(args) => (CheckKind::Checkin, args),
        Command::Errors(args) => (CheckKind::Errors, args),
        Command::DiskUsage(args) => (CheckKind::DiskUsage, args),
        Command::OsCurrency(args) => (CheckKind::OsCurrency, args),
    };

    let env = EnvSecretStore::new();
    let settings = Settings::resolve(&cli.credentials, file, &env, !args.dry_run)?;
    let collaborators = Collaborators::from_settings(&settings)?;

    let report = run_check(kind, &settings.checks, &collaborators, Utc::now()).await?;
    info!(
        check = %report.check,
        violations = report.violations.len(),
        delivered = report.delivered,
        "Check complete"
    );
    Ok(())
}

fn execute_secret(action: SecretCommand, file: FileConfig) -> anyhow::Result<()> {
    let SecretCommand::Store {
        service,
        account,
        store,
    } = action;

    let path = store
        .or(file.secret_store)
        .ok_or_else(|| Error::config("no secret store configured, pass --store or set secret_store"))?;

    let mut secret = String::new();
    std::io::stdin()
        .read_to_string(&mut secret)
        .context("failed to read secret from stdin")?;
    let secret = secret.trim_end_matches(&['\r', '\n'][..]);
    if secret.is_empty() {
        return Err(Error::config("no secret provided on stdin").into());
    }

    let store = FileSecretStore::new(path);
    let outcome = store_with_rotation(
        &store,
        &account,
        &service,
        secret,
        Utc::now(),
        Duration::days(DEFAULT_ROTATION_DAYS),
    )?;

    println!("{}: {:?}", service, outcome);
    Ok(())
}

/// Map a failed run to its process exit status
pub fn failure_exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>()
        .map(exit_code)
        .unwrap_or(EXIT_CONFIG)
}

/// Initialize tracing/logging
///
/// Logs go to stderr so dry-run reports on stdout stay clean.
pub fn init_tracing(verbose: bool) {
    use std::io::IsTerminal;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("fleetcheck=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleetcheck=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}
