use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use health_poller::error::FATAL_EXIT_CODE;
use health_poller::telemetry::init_telemetry;
use health_poller::{build_client, exit_err, schedule_process_crash, Config, PollArgs, Poller};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry();

    let args = PollArgs::parse();
    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(err) => exit_err!(FATAL_EXIT_CODE, "Invalid configuration: {:#}", err),
    };

    // held for the lifetime of the process, the timer keeps running either way
    let _crash = schedule_process_crash(config.max_crash_delay_secs);

    let client = match build_client(config.ca_cert_path.as_deref()) {
        Ok(client) => client,
        Err(err) => exit_err!(FATAL_EXIT_CODE, "{:#}", err),
    };

    let poller = Poller::new(client, config.target_url, config.poll_interval);
    info!(
        "Polling {} every {} second(s)",
        poller.url(),
        poller.interval().as_secs()
    );

    // no graceful shutdown, the token is never cancelled in production
    let shutdown = CancellationToken::new();
    poller.run(&shutdown, |outcome| outcome.log()).await;
    Ok(())
}
