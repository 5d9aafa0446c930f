//! Shared HTTP plumbing for discovery and downloads

use std::time::Duration;

use tracing::{debug, warn};

use crate::schema::error::RemoteError;

const USER_AGENT: &str = concat!("schema-updater/", env!("CARGO_PKG_VERSION"));

/// Builds a client whose requests all fail after `timeout`
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Sends a GET request and maps non-success statuses to [`RemoteError`]
pub async fn get(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, RemoteError> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(url.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(RemoteError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("Remote returned status {}: {}", status, url);
        return Err(RemoteError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}

/// Downloads the full response body
pub async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, RemoteError> {
    let response = get(client, url).await?;
    Ok(response.bytes().await?.to_vec())
}
