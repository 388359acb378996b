//! Shared HTTP plumbing for the collectors.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ScraperError;

/// Builds the `reqwest::Client` shared by both collectors.
///
/// `timeout_secs` bounds every request end to end; a request that exceeds it
/// fails with a timeout error local to that request.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.clamp(1, 10)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parses `raw` as a base URL with exactly one trailing slash, so that
/// [`Url::join`] appends to the path rather than replacing its last segment.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ScraperError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url, ScraperError> {
    base.join(path).map_err(|e| ScraperError::InvalidBaseUrl {
        url: base.to_string(),
        reason: format!("cannot join \"{path}\": {e}"),
    })
}

/// Sends `request`, requires a 2xx status and parses the body as JSON.
///
/// # Errors
///
/// - [`ScraperError::UnexpectedStatus`] for any non-2xx status.
/// - [`ScraperError::Http`] on network failure or timeout.
/// - [`ScraperError::Deserialize`] if the body does not match `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> Result<T, ScraperError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;
    let status = response.status();

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}
