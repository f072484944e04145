//! FleetCheck
//!
//! Fleet compliance checks for MDM-managed devices.

use clap::Parser;
use fleetcheck_cli::{execute, failure_exit_code, init_tracing, Cli};
use std::process::ExitCode;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    fleetcheck_telemetry::describe_metrics();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(failure_exit_code(&err))
        }
    }
}
