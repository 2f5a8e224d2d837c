use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Installs the global subscriber: `RUST_LOG` filtering (default `INFO`) and line-oriented output on stderr.
pub fn init_telemetry() {
    let registry = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("INFO")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if let Err(err) = registry.try_init() {
        eprintln!("Failed to install log subscriber: {err}");
    }
}
