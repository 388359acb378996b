//! Run-outcome notification.
//!
//! A [`Notifier`] receives the final [`RunResult`] of every run, success or
//! failure. Delivery is best effort: the coordinator logs a failed delivery
//! and never lets it change the run's outcome.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use champtrend_core::{AppConfig, RunResult};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, result: &RunResult) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. `"webhook"`).
    fn channel_name(&self) -> &str;
}

/// Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, result: &RunResult) -> Result<(), NotifyError> {
        tracing::debug!(run_date = %result.run_date, "no notification channel configured");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "noop"
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    username: &'a str,
}

/// Posts `{"content": ..., "username": ...}` to a chat-style webhook.
///
/// Any 2xx response (typically 204) counts as delivered.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    username: String,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &"[redacted]")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl WebhookNotifier {
    #[must_use]
    pub fn new(client: Client, url: &str, username: &str) -> Self {
        Self {
            client,
            url: url.to_owned(),
            username: username.to_owned(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, result: &RunResult) -> Result<(), NotifyError> {
        let content = render_message(result);
        let payload = WebhookPayload {
            content: &content,
            username: &self.username,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_owned());
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(%status, "webhook notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

/// Formats the one-line message sent for a run.
#[must_use]
pub fn render_message(result: &RunResult) -> String {
    let counts = format!(
        "{} entities, {} metrics, {} skipped, {} rows written",
        result.entity_count, result.metric_count, result.skipped_count, result.rows_written
    );

    if result.is_success() {
        format!("[champtrend] run {} succeeded: {counts}", result.run_date)
    } else {
        let stage = result
            .failed_stage
            .map_or_else(|| "unknown stage".to_owned(), |s| s.to_string());
        let detail = result.error_detail.as_deref().unwrap_or("no detail");
        format!(
            "[champtrend] run {} FAILED at {stage}: {detail} ({counts})",
            result.run_date
        )
    }
}

/// Sends `result` and logs a failed delivery instead of returning it.
pub async fn notify_best_effort(notifier: &dyn Notifier, result: &RunResult) {
    if let Err(e) = notifier.notify(result).await {
        tracing::warn!(
            channel = notifier.channel_name(),
            error = %e,
            "failed to deliver run notification"
        );
    }
}

/// Webhook notifier when a URL is configured, otherwise [`NoopNotifier`].
#[must_use]
pub fn notifier_from_config(config: &AppConfig, client: Client) -> Box<dyn Notifier> {
    match config.webhook_url.as_deref() {
        Some(url) => Box::new(WebhookNotifier::new(client, url, &config.webhook_username)),
        None => Box::new(NoopNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use champtrend_core::RunStage;
    use chrono::NaiveDate;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn success_message_lists_counts() {
        let mut result = RunResult::started(run_date());
        result.entity_count = 168;
        result.metric_count = 10;
        result.rows_written = 178;

        let message = render_message(&result);
        assert_eq!(
            message,
            "[champtrend] run 2024-01-02 succeeded: 168 entities, 10 metrics, 0 skipped, 178 rows written"
        );
    }

    #[test]
    fn failure_message_names_stage_and_detail() {
        let mut result = RunResult::started(run_date());
        result.entity_count = 3;
        let result = result.into_failure(RunStage::FetchMetric, "bilibili unavailable".to_owned());

        let message = render_message(&result);
        assert!(message.contains("FAILED at fetch_metric"), "{message}");
        assert!(message.contains("bilibili unavailable"), "{message}");
        assert!(message.contains("3 entities"), "{message}");
    }
}
