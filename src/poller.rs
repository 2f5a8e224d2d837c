use std::fmt::Display;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use reqwest::{Client, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of a single request to the target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    RequestFailed { url: String, error: String },
    /// Any status other than 200. The body is not read.
    UnexpectedStatus { url: String, status: StatusCode },
    /// A 200 response. `read_error` is set when the body stream broke, `body` then holds what arrived before.
    Success {
        url: String,
        status: StatusCode,
        body: String,
        read_error: Option<String>,
    },
}

impl Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PollOutcome::RequestFailed { url, error } => {
                write!(f, "Error requesting [{}]: {}", url, error)
            }
            PollOutcome::UnexpectedStatus { url, status } => {
                write!(f, "Request to [{}] returned [{}]", url, status.as_u16())
            }
            PollOutcome::Success {
                url, status, body, ..
            } => write!(
                f,
                "Request to [{}] returned [{}]: {}",
                url,
                status.as_u16(),
                body
            ),
        }
    }
}

impl PollOutcome {
    pub fn url(&self) -> &str {
        match self {
            PollOutcome::RequestFailed { url, .. }
            | PollOutcome::UnexpectedStatus { url, .. }
            | PollOutcome::Success { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PollOutcome::Success {
                read_error: None,
                ..
            }
        )
    }

    /// Writes the outcome to the log, one line per event.
    pub fn log(&self) {
        match self {
            PollOutcome::RequestFailed { .. } => error!("{}", self),
            PollOutcome::UnexpectedStatus { .. } => warn!("{}", self),
            PollOutcome::Success {
                url, read_error, ..
            } => {
                if let Some(err) = read_error {
                    error!("Error reading response from [{}]: {}", url, err);
                }
                info!("{}", self);
            }
        }
    }

    /// Returns the body of a complete 200 response, anything else is an error.
    pub fn into_result(self) -> Result<String> {
        match self {
            PollOutcome::Success {
                body,
                read_error: None,
                ..
            } => Ok(body),
            PollOutcome::Success {
                url,
                read_error: Some(err),
                ..
            } => bail!("Error reading response from [{}]: {}", url, err),
            other => Err(anyhow!("{}", other)),
        }
    }
}

/// Requests one URL over and over with a fixed pause in between.
#[derive(Debug, Clone)]
pub struct Poller {
    client: Client,
    url: String,
    interval: Duration,
}

impl Poller {
    pub fn new(client: Client, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            interval,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[tracing::instrument(level = "debug", skip(self), fields(url = %self.url))]
    pub async fn poll_once(&self) -> PollOutcome {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(err) => {
                return PollOutcome::RequestFailed {
                    url: self.url.clone(),
                    error: format!("{:#}", anyhow::Error::from(err)),
                }
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return PollOutcome::UnexpectedStatus {
                url: self.url.clone(),
                status,
            };
        }

        let (body, read_error) = read_body(response).await;
        PollOutcome::Success {
            url: self.url.clone(),
            status,
            body,
            read_error,
        }
    }

    /// Polls until `shutdown` is cancelled, handing every outcome to `on_poll`.
    ///
    /// Failures never end the loop and never change the interval. Cancellation is honoured while a request
    /// is in flight as well as during the pause.
    pub async fn run<F>(&self, shutdown: &CancellationToken, mut on_poll: F)
    where
        F: FnMut(PollOutcome),
    {
        debug!(
            "Polling {} every {} second(s)",
            self.url,
            self.interval.as_secs()
        );
        loop {
            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };
            on_poll(outcome);

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        debug!("Stopped polling {}", self.url);
    }
}

/// Reads the body chunk by chunk so a broken stream still returns what arrived.
async fn read_body(mut response: Response) -> (String, Option<String>) {
    let mut data = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => data.extend_from_slice(&chunk),
            Ok(None) => return (String::from_utf8_lossy(&data).into_owned(), None),
            Err(err) => {
                return (
                    String::from_utf8_lossy(&data).into_owned(),
                    Some(format!("{:#}", anyhow::Error::from(err))),
                )
            }
        }
    }
}
