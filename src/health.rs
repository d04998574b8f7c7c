//! Pre-run health probe against the server's HTTP health endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// The probe request could not be sent or timed out.
    #[error("health request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("health check at {url} returned {status}")]
    Unhealthy { url: String, status: StatusCode },
}

/// `GET url` and require a 2xx status within `timeout`.
///
/// # Errors
///
/// Returns [`HealthError::Http`] on transport failure and
/// [`HealthError::Unhealthy`] on a non-success status.
pub async fn check_health(url: &str, timeout: Duration) -> Result<(), HealthError> {
    let response = reqwest::Client::new()
        .get(url)
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(HealthError::Unhealthy {
            url: url.to_owned(),
            status,
        });
    }

    info!(%url, %status, "health check passed");
    Ok(())
}
