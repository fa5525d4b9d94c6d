use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Error;

/// Total attempts, not retries after the first failure.
pub const MAX_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct StatusPayload<'a> {
    status: &'a str,
    visibility: &'a str,
}

/// Submits the composed message as an unlisted status on the configured
/// instance, retrying with exponential backoff until the attempt cap.
///
/// # Errors
///
/// Returns [`Error::Publish`] once every attempt has failed.
pub async fn publish_status(
    client: &Client,
    endpoint_url: &str,
    access_token: &str,
    message: &str,
) -> Result<(), Error> {
    publish_with_retry(
        client,
        endpoint_url,
        access_token,
        message,
        MAX_ATTEMPTS,
        RETRY_BASE_DELAY,
    )
    .await
}

async fn publish_with_retry(
    client: &Client,
    endpoint_url: &str,
    access_token: &str,
    message: &str,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<(), Error> {
    for attempt in 1..=max_attempts {
        match post_status(client, endpoint_url, access_token, message).await {
            Ok(()) => {
                info!("Status published on attempt {attempt}");
                return Ok(());
            }
            Err(e) => {
                warn!("Publish attempt {attempt}/{max_attempts} failed: {e}");
                if attempt < max_attempts {
                    sleep(base_delay * 2u32.pow(attempt - 1)).await;
                }
            }
        }
    }
    Err(Error::Publish {
        attempts: max_attempts,
    })
}

async fn post_status(
    client: &Client,
    endpoint_url: &str,
    access_token: &str,
    message: &str,
) -> Result<(), reqwest::Error> {
    let url = format!("{}/api/v1/statuses", endpoint_url.trim_end_matches('/'));
    let payload = StatusPayload {
        status: message,
        visibility: "unlisted",
    };

    client
        .post(url)
        .bearer_auth(access_token)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
