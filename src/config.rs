use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use reqwest::Url;

/// Flags of the looping poller. Every flag can also be set through its upper snake case environment variable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct PollArgs {
    /// URL to request
    #[arg(long, env, default_value = "")]
    pub request_url: String,

    /// Interval in seconds between requests
    #[arg(long, env, default_value_t = 1)]
    pub request_interval: u64,

    /// Maximum duration in seconds to wait before crashing, 0 disables crashing
    #[arg(long, env, default_value_t = 0)]
    pub crash: u64,

    /// Path to a PEM encoded CA certificate bundle, empty uses the system trust store
    #[arg(long, env, default_value = "")]
    pub ca_path: String,
}

/// Settings of the single-shot check, read from the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Request a service once and exit", long_about = None)]
pub struct OnceArgs {
    /// URL to request once
    #[arg(long, env = "SERVICE_ADDR")]
    pub service_addr: Url,

    /// Path to a PEM encoded CA certificate bundle
    #[arg(long, env = "PATH_CA")]
    pub path_ca: Option<PathBuf>,

    /// Refuse to run without a CA bundle, the environment accepts `1`, `true`, `yes` and `on`
    #[arg(long, env = "REQUIRE_CA", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub require_ca: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Validated lazily, a malformed URL fails every request instead of startup
    pub target_url: String,
    pub poll_interval: Duration,
    pub max_crash_delay_secs: u64,
    pub ca_cert_path: Option<PathBuf>,
}

impl TryFrom<PollArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: PollArgs) -> Result<Self> {
        let target_url = args.request_url.trim().to_string();
        if target_url.is_empty() {
            bail!("Missing request URL, set --request-url or REQUEST_URL");
        }

        Ok(Config {
            target_url,
            poll_interval: Duration::from_secs(args.request_interval),
            max_crash_delay_secs: args.crash,
            ca_cert_path: non_empty_path(PathBuf::from(args.ca_path)),
        })
    }
}

impl OnceArgs {
    /// Returns the CA path to use, failing when one is required but absent.
    pub fn ca_cert_path(&self) -> Result<Option<PathBuf>> {
        let path = self.path_ca.clone().and_then(non_empty_path);
        if self.require_ca && path.is_none() {
            bail!("Missing CA certificate path, set PATH_CA");
        }
        Ok(path)
    }
}

fn non_empty_path(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // none of the tests set these, only an outer environment could
    fn clear_env() {
        for var in [
            "REQUEST_URL",
            "REQUEST_INTERVAL",
            "CRASH",
            "CA_PATH",
            "SERVICE_ADDR",
            "PATH_CA",
            "REQUIRE_CA",
        ] {
            std::env::remove_var(var);
        }
    }

    fn config_from(args: &[&str]) -> Result<Config> {
        clear_env();
        let args = PollArgs::try_parse_from(std::iter::once("health_poller").chain(args.iter().copied()))?;
        Config::try_from(args)
    }

    #[test]
    fn defaults_apply_to_optional_flags() {
        let config = config_from(&["--request-url", "http://example.test/health"]).unwrap();

        assert_eq!(config.target_url, "http://example.test/health");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_crash_delay_secs, 0);
        assert_eq!(config.ca_cert_path, None);
    }

    #[test]
    fn all_flags_are_parsed() {
        let config = config_from(&[
            "--request-url",
            "https://service:8443/ready",
            "--request-interval",
            "0",
            "--crash",
            "30",
            "--ca-path",
            "/etc/ca/bundle.pem",
        ])
        .unwrap();

        assert_eq!(config.poll_interval, Duration::ZERO);
        assert_eq!(config.max_crash_delay_secs, 30);
        assert_eq!(config.ca_cert_path, Some(PathBuf::from("/etc/ca/bundle.pem")));
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = config_from(&["--request-url", "  "]).unwrap_err();
        assert!(err.to_string().contains("Missing request URL"));
    }

    #[test]
    fn malformed_url_is_left_to_the_request() {
        let config = config_from(&["--request-url", "not a url"]).unwrap();
        assert_eq!(config.target_url, "not a url");
    }

    #[test]
    fn negative_interval_is_rejected() {
        clear_env();
        let args = PollArgs::try_parse_from([
            "health_poller",
            "--request-url",
            "http://example.test",
            "--request-interval",
            "-1",
        ]);
        assert!(args.is_err());
    }

    #[test]
    fn once_args_require_ca_when_asked() {
        clear_env();
        let args = OnceArgs::try_parse_from([
            "health_poller_once",
            "--service-addr",
            "https://service.test/health",
            "--require-ca",
        ])
        .unwrap();
        assert!(args.ca_cert_path().is_err());

        let args = OnceArgs::try_parse_from([
            "health_poller_once",
            "--service-addr",
            "https://service.test/health",
            "--path-ca",
            "/etc/ca/bundle.pem",
            "--require-ca",
        ])
        .unwrap();
        assert_eq!(
            args.ca_cert_path().unwrap(),
            Some(PathBuf::from("/etc/ca/bundle.pem"))
        );
    }

    #[test]
    fn once_args_reject_malformed_url() {
        clear_env();
        let args = OnceArgs::try_parse_from(["health_poller_once", "--service-addr", "::nope"]);
        assert!(args.is_err());
    }
}
