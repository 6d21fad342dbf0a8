//! Bounded-timeout HTTP probing of a single target

use crate::errors::{CanaryError, Result};
use crate::targets::Target;
use reqwest::{Client, StatusCode, redirect};
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Result of one probe attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The request completed and the body was read in full
    Responded { status: StatusCode, elapsed: Duration },

    /// The request failed before a complete response was received
    Failed { kind: ProbeFailure, reason: String },
}

impl ProbeOutcome {
    /// A target is available only when it answered with exactly 200
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Responded { status, .. } if *status == StatusCode::OK)
    }
}

/// Transport-level failure reasons absorbed by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    Connect,
    InvalidUrl,
    Request,
    Body,
    Other,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "TIMEOUT"),
            ProbeFailure::Connect => write!(f, "CONNECT"),
            ProbeFailure::InvalidUrl => write!(f, "INVALID_URL"),
            ProbeFailure::Request => write!(f, "REQUEST"),
            ProbeFailure::Body => write!(f, "BODY"),
            ProbeFailure::Other => write!(f, "OTHER"),
        }
    }
}

impl From<&reqwest::Error> for ProbeFailure {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else if err.is_connect() {
            ProbeFailure::Connect
        } else if err.is_builder() {
            ProbeFailure::InvalidUrl
        } else if err.is_body() || err.is_decode() {
            ProbeFailure::Body
        } else if err.is_request() || err.is_redirect() {
            ProbeFailure::Request
        } else {
            ProbeFailure::Other
        }
    }
}

/// HTTP prober sharing one connection pool across probes
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober whose requests are bounded by `probe_timeout`
    pub fn new(probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(probe_timeout)
            .redirect(redirect::Policy::none())
            .user_agent(format!("site_canary/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CanaryError::Http)?;

        Ok(Self {
            client,
            timeout: probe_timeout,
        })
    }

    /// Issue one GET against the target. Never retries.
    pub async fn probe(&self, target: &Target) -> ProbeOutcome {
        let start = Instant::now();

        let attempt = async {
            let response = self.client.get(target.url()).send().await?;
            let status = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        };

        let outcome = match timeout(self.timeout, attempt).await {
            Ok(Ok(status)) => ProbeOutcome::Responded {
                status,
                elapsed: start.elapsed(),
            },
            Ok(Err(e)) => ProbeOutcome::Failed {
                kind: ProbeFailure::from(&e),
                reason: e.to_string(),
            },
            Err(_) => ProbeOutcome::Failed {
                kind: ProbeFailure::Timeout,
                reason: format!("no response within {:?}", self.timeout),
            },
        };

        debug!(site = %target, outcome = ?outcome, "Probe finished");
        outcome
    }
}
