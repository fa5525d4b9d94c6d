pub mod config;
pub mod error;
pub mod fleet;
pub mod probe;
pub mod publish;
pub mod report;

pub use config::Config;
pub use error::Error;

use log::{info, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The status message was composed and posted.
    Published,
    /// Dry run: the message was composed and logged, publishing is disabled.
    PublishSkipped,
    /// The run was cancelled before anything was published.
    Interrupted,
}

impl RunOutcome {
    /// Exit codes are distinct on purpose: a dry run is not an error, but it
    /// must not look like a published run either.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Published => 0,
            RunOutcome::PublishSkipped => 2,
            RunOutcome::Interrupted => 130,
        }
    }
}

/// Runs one full check cycle: probe the fleet, compose the report, publish
/// it (unless disabled). Cancelling the token aborts the cycle without
/// publishing.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built, when the composed
/// message is empty, or when publishing fails after exhausting its retries.
pub async fn run(config: &Config, token: &CancellationToken) -> Result<RunOutcome, Error> {
    info!(
        "Checking {} services for {}",
        config.services.len(),
        config.config.site_name
    );
    info!("Timeout: {} seconds", config.config.timeout_secs);
    if config.config.disable_publishing {
        warn!("Publishing is disabled, the report will only be logged");
    }
    if config.config.fail_everything {
        warn!("FAIL_EVERYTHING is set, every probe will report timed out");
    }

    if token.is_cancelled() {
        info!("Shutdown requested, stopping before the check");
        return Ok(RunOutcome::Interrupted);
    }

    let prober = probe::Prober::new(
        Duration::from_secs(config.config.timeout_secs),
        config.config.fail_everything,
    )?;

    let results = select! {
        results = fleet::check_fleet(&prober, &config.services) => results,
        () = token.cancelled() => {
            info!("Shutdown requested during the check, nothing will be published");
            return Ok(RunOutcome::Interrupted);
        }
    };

    for result in &results {
        if result.is_failing() {
            warn!("{}", report::service_line(result));
        } else {
            info!("{}", report::service_line(result));
        }
    }

    let message = report::compose_message(
        &config.config.site_name,
        config.config.partial_outage_threshold,
        &config.config.hashtags,
        &results,
    );
    if message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }

    if config.config.disable_publishing {
        info!("Composed report:\n{message}");
        return Ok(RunOutcome::PublishSkipped);
    }

    // Both are enforced by Config::load when publishing is enabled
    let access_token = config
        .config
        .access_token
        .as_deref()
        .ok_or_else(|| Error::Config("access_token is not set".to_string()))?;
    let endpoint_url = config
        .config
        .posting_endpoint_url
        .as_deref()
        .ok_or_else(|| Error::Config("posting_endpoint_url is not set".to_string()))?;

    let client = Client::new();
    select! {
        result = publish::publish_status(&client, endpoint_url, access_token, &message) => result?,
        () = token.cancelled() => {
            info!("Shutdown requested while publishing, giving up");
            return Ok(RunOutcome::Interrupted);
        }
    }
    info!("Status published to {endpoint_url}");

    Ok(RunOutcome::Published)
}
