//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the MDM bearer token
pub const TOKEN_VAR: &str = "DEVICE_CHECK_24";
/// Environment variable holding the MDM base URL
pub const BASE_URL_VAR: &str = "KANDJI_BASE_URL";
/// Environment variable holding the chat channel id
pub const CHANNEL_VAR: &str = "KANDJI_NOTIFICATIONS_ID";
/// Environment variable holding the chat webhook URL
pub const WEBHOOK_VAR: &str = "KANDJI_NOTIFICATIONS_WEBHOOK";

#[derive(Parser, Debug)]
#[command(name = "fleetcheck")]
#[command(version, about = "Fleet compliance checks for MDM-managed devices", long_about = None)]
pub struct Cli {
    /// Settings file path
    #[arg(short, long, global = true, default_value = "fleetcheck.yaml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection values; each falls back to its environment variable when the
/// flag is not given
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// MDM API bearer token [env: DEVICE_CHECK_24]
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// MDM tenant base URL [env: KANDJI_BASE_URL]
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Chat channel id [env: KANDJI_NOTIFICATIONS_ID]
    #[arg(long, global = true)]
    pub channel: Option<String>,

    /// Chat webhook URL [env: KANDJI_NOTIFICATIONS_WEBHOOK]
    #[arg(long, global = true)]
    pub webhook_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report devices that have not checked in for more than 24 hours
    Checkin(CheckArgs),

    /// Report library items in an error state
    Errors(CheckArgs),

    /// Report Macs whose system volume is over 70% full
    DiskUsage(CheckArgs),

    /// Report devices not running the latest macOS or iOS release
    OsCurrency(CheckArgs),

    /// Manage stored credentials
    Secret {
        #[command(subcommand)]
        action: SecretCommand,
    },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct CheckArgs {
    /// Print the report to stdout instead of posting it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum SecretCommand {
    /// Read a secret from stdin and store it, replacing entries older than 30 days
    Store {
        /// Service name, e.g. DEVICE_CHECK_24
        #[arg(long)]
        service: String,

        /// Account the secret belongs to
        #[arg(long)]
        account: String,

        /// Secret store file; defaults to `secret_store` from the settings file
        #[arg(long)]
        store: Option<PathBuf>,
    },
}
