use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use health_poller::error::FATAL_EXIT_CODE;
use health_poller::telemetry::init_telemetry;
use health_poller::{build_client, exit_err, OnceArgs, Poller};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry();

    let args = OnceArgs::parse();
    let ca_path = match args.ca_cert_path() {
        Ok(path) => path,
        Err(err) => exit_err!(FATAL_EXIT_CODE, "Invalid configuration: {:#}", err),
    };
    let client = match build_client(ca_path.as_deref()) {
        Ok(client) => client,
        Err(err) => exit_err!(FATAL_EXIT_CODE, "{:#}", err),
    };

    let poller = Poller::new(client, args.service_addr.as_str(), Duration::ZERO);
    let outcome = poller.poll_once().await;
    outcome.log();
    if let Err(err) = outcome.into_result() {
        exit_err!(FATAL_EXIT_CODE, "Health check failed: {:#}", err);
    }
    Ok(())
}
