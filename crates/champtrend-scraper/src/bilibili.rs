//! Metric collector backed by the Bilibili video search API.
//!
//! For each entity the collector searches `"{prefix} {name}"` ordered by
//! click count and sums the view counts of the first `top_n` results.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::COOKIE;
use reqwest::{Client, Url};
use serde_json::Value;

use champtrend_core::{AppConfig, MetricSnapshot};

use crate::batch::{Batch, EntityOutcome};
use crate::client::{join_url, parse_base_url, send_json};
use crate::collector::MetricCollector;
use crate::error::ScraperError;
use crate::politeness::PolitenessDelay;
use crate::types::SearchEnvelope;

pub const DEFAULT_TOP_N: usize = 5;

const SOURCE_NAME: &str = "bilibili";
const SEARCH_PATH: &str = "x/web-interface/search/type";

pub struct BilibiliCollector {
    client: Client,
    base_url: Url,
    keyword_prefix: String,
    cookie: String,
    top_n: usize,
    max_entities: Option<usize>,
    delay: PolitenessDelay,
}

impl BilibiliCollector {
    /// Creates a collector with no entity cap, no politeness delay, no cookie
    /// and the default `top_n`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str, keyword_prefix: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            keyword_prefix: keyword_prefix.to_owned(),
            cookie: String::new(),
            top_n: DEFAULT_TOP_N,
            max_entities: None,
            delay: PolitenessDelay::none(),
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the configured metric base
    /// URL does not parse.
    pub fn from_config(client: Client, config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(
            Self::new(client, &config.metric_base_url, &config.metric_keyword_prefix)?
                .with_cookie(&config.scraper_cookie)
                .with_top_n(config.metric_top_n)
                .with_max_entities(config.max_entities_per_run)
                .with_delay(PolitenessDelay::new(
                    config.scraper_min_delay_ms,
                    config.scraper_max_delay_ms,
                )),
        )
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.cookie = cookie.to_owned();
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[must_use]
    pub fn with_max_entities(mut self, max_entities: Option<usize>) -> Self {
        self.max_entities = max_entities;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: PolitenessDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Fetches the summed view count for one entity.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Api`] if the envelope `code` is non-zero.
    /// - [`ScraperError::Malformed`] if a result's `play` is not numeric.
    /// - [`ScraperError::UnexpectedStatus`], [`ScraperError::Http`] or
    ///   [`ScraperError::Deserialize`] for transport and body failures.
    pub async fn fetch_views(&self, entity_name: &str) -> Result<u64, ScraperError> {
        let url = join_url(&self.base_url, SEARCH_PATH)?;
        let keyword = format!("{} {entity_name}", self.keyword_prefix);
        let context = format!("search(keyword={keyword})");

        let mut request = self.client.get(url).query(&[
            ("keyword", keyword.as_str()),
            ("search_type", "video"),
            ("order", "click"),
        ]);
        if !self.cookie.is_empty() {
            request = request.header(COOKIE, &self.cookie);
        }

        let envelope: SearchEnvelope = send_json(request, &context).await?;
        if envelope.code != 0 {
            return Err(ScraperError::Api {
                code: envelope.code,
                message: envelope.message,
                context,
            });
        }

        let results = envelope
            .data
            .and_then(|data| data.result)
            .unwrap_or_default();
        sum_top_views(&results, self.top_n).map_err(|reason| ScraperError::Malformed { context, reason })
    }

    fn roster<'a>(&self, entities: &'a [String]) -> &'a [String] {
        match self.max_entities {
            Some(limit) if limit < entities.len() => {
                tracing::info!(
                    limit,
                    roster = entities.len(),
                    "entity limit applied to metric collection"
                );
                &entities[..limit]
            }
            _ => entities,
        }
    }
}

/// Sums views over the first `top_n` results.
///
/// `play` may be a number or a numeric string. A result without `play` falls
/// back to `stat.view`, and to 0 when neither exists.
pub(crate) fn sum_top_views(results: &[Value], top_n: usize) -> Result<u64, String> {
    results.iter().take(top_n).try_fold(0u64, |total, item| {
        item_views(item).map(|views| total.saturating_add(views))
    })
}

fn item_views(item: &Value) -> Result<u64, String> {
    if let Some(play) = item.get("play") {
        return as_count(play).ok_or_else(|| format!("play is not a count: {play}"));
    }
    match item.get("stat").and_then(|stat| stat.get("view")) {
        Some(view) => as_count(view).ok_or_else(|| format!("stat.view is not a count: {view}")),
        None => Ok(0),
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether a failed entity fetch ends the whole metric batch.
///
/// A connect failure only counts once nothing has been collected; after a
/// success it is skipped like any other per-entity error, and the
/// all-skipped check still catches a source that went away for good.
fn aborts_batch(err: &ScraperError, collected: usize) -> bool {
    match err {
        ScraperError::Http(_) => err.is_source_level() && collected == 0,
        _ => err.is_source_level(),
    }
}

#[async_trait]
impl MetricCollector for BilibiliCollector {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn collect(
        &self,
        run_date: NaiveDate,
        entities: &[String],
    ) -> Result<Batch<MetricSnapshot>, ScraperError> {
        let roster = self.roster(entities);
        let mut batch = Batch::default();

        for (index, entity_name) in roster.iter().enumerate() {
            self.delay.pause().await;
            tracing::debug!(entity = %entity_name, position = index + 1, total = roster.len(), "searching");

            match self.fetch_views(entity_name).await {
                Ok(metric_value) => batch.push(EntityOutcome::Collected(MetricSnapshot {
                    entity_name: entity_name.clone(),
                    metric_value,
                    scrape_date: run_date,
                })),
                Err(e) if aborts_batch(&e, batch.records.len()) => {
                    tracing::error!(entity = %entity_name, error = %e, "metric source unavailable");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(entity = %entity_name, error = %e, "skipping metric for entity");
                    batch.push(EntityOutcome::Skipped {
                        entity_name: entity_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if batch.all_skipped() {
            return Err(ScraperError::SourceUnavailable {
                source_name: SOURCE_NAME,
                reason: format!("all {} attempted entities failed", batch.attempted()),
            });
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sums_only_first_top_n_results() {
        let results: Vec<Value> = (1..=8).map(|i| json!({ "play": i * 100 })).collect();
        assert_eq!(sum_top_views(&results, 5), Ok(1_500));
    }

    #[test]
    fn play_accepts_numeric_strings() {
        let results = vec![json!({ "play": "1200" }), json!({ "play": 300 })];
        assert_eq!(sum_top_views(&results, 5), Ok(1_500));
    }

    #[test]
    fn falls_back_to_stat_view_then_zero() {
        let results = vec![
            json!({ "stat": { "view": 700 } }),
            json!({ "title": "no counters" }),
            json!({ "play": 50 }),
        ];
        assert_eq!(sum_top_views(&results, 5), Ok(750));
    }

    #[test]
    fn non_numeric_play_is_malformed() {
        let results = vec![json!({ "play": 10 }), json!({ "play": "--" })];
        let err = sum_top_views(&results, 5).unwrap_err();
        assert!(err.contains("play"), "err: {err}");
    }

    #[test]
    fn empty_results_sum_to_zero() {
        assert_eq!(sum_top_views(&[], 5), Ok(0));
    }

    #[test]
    fn auth_failure_aborts_even_after_successes() {
        let forbidden = ScraperError::UnexpectedStatus {
            status: 403,
            url: "https://api.bilibili.com".to_owned(),
        };
        assert!(aborts_batch(&forbidden, 0));
        assert!(aborts_batch(&forbidden, 4));
    }

    #[tokio::test]
    async fn refused_connection_aborts_only_an_empty_batch() {
        let err = Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .expect_err("nothing listens on port 1");
        let err = ScraperError::from(err);

        assert!(aborts_batch(&err, 0));
        assert!(!aborts_batch(&err, 3));
    }
}
