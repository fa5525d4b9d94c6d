use log::warn;
use reqwest::Client;
use std::time::{Duration, Instant};

use crate::config::Service;
use crate::error::Error;

/// Outcome of one probe. A service either answered (with any status code) or
/// it did not; there is no third state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    Responded { status: u16, elapsed_ms: u64 },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResult {
    pub name: String,
    pub outcome: PingOutcome,
}

impl PingResult {
    pub fn responded(name: impl Into<String>, status: u16, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            outcome: PingOutcome::Responded { status, elapsed_ms },
        }
    }

    pub fn timed_out(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: PingOutcome::TimedOut,
        }
    }

    /// A service counts as failing when it never answered or answered with
    /// anything other than 200.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        !matches!(self.outcome, PingOutcome::Responded { status: 200, .. })
    }
}

/// Issues bounded-timeout GET requests. One shared client, cloned per probe
/// task; the timeout applies per request, so one slow probe never delays the
/// others.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    fail_everything: bool,
}

impl Prober {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, fail_everything: bool) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            fail_everything,
        })
    }

    /// Pings a single service. Any received HTTP response counts as an
    /// answer, whatever the status code; only a missing response (timeout,
    /// DNS failure, refused connection, TLS error) classifies as timed out.
    pub async fn ping(&self, service: &Service) -> PingResult {
        if self.fail_everything {
            return PingResult::timed_out(service.name.clone());
        }

        let start = Instant::now();
        match self.client.get(&service.url).send().await {
            Ok(response) => {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                PingResult::responded(service.name.clone(), response.status().as_u16(), elapsed_ms)
            }
            // We collapse every transport-level failure into "timed out"
            // since we have no way of telling a network error apart from a
            // real down on the server side
            Err(e) => {
                warn!("{}: no response ({e})", service.name);
                PingResult::timed_out(service.name.clone())
            }
        }
    }
}
