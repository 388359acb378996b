//! Reference collector backed by Riot's Data Dragon CDN.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Url};

use champtrend_core::{AppConfig, EntitySnapshot};

use crate::batch::{Batch, EntityOutcome};
use crate::client::{join_url, parse_base_url, send_json};
use crate::collector::ReferenceCollector;
use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::{ChampionDocument, ChampionEntry};

const SOURCE_NAME: &str = "ddragon";

/// Reads the champion roster of the newest Data Dragon version.
///
/// Two requests per run: `api/versions.json` (first element is the newest
/// version) and `cdn/{version}/data/{locale}/champion.json`. Both are
/// source-level and retried on transient errors.
pub struct DataDragonCollector {
    client: Client,
    base_url: Url,
    locale: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DataDragonCollector {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(client: Client, base_url: &str, locale: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            locale: locale.to_owned(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the configured reference
    /// base URL does not parse.
    pub fn from_config(client: Client, config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(client, &config.reference_base_url, &config.reference_locale)?
            .with_retry(config.scraper_max_retries, config.scraper_retry_backoff_base_ms))
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Returns the newest published version, e.g. `"14.1.1"`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SourceUnavailable`] when the version list is
    /// empty, or the request error once retries are exhausted.
    pub async fn latest_version(&self) -> Result<String, ScraperError> {
        let url = join_url(&self.base_url, "api/versions.json")?;
        let versions: Vec<String> = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            send_json(self.client.get(url.clone()), "versions.json")
        })
        .await?;

        versions
            .into_iter()
            .next()
            .ok_or_else(|| ScraperError::SourceUnavailable {
                source_name: SOURCE_NAME,
                reason: "versions.json is empty".to_owned(),
            })
    }

    async fn champion_document(&self, version: &str) -> Result<ChampionDocument, ScraperError> {
        let path = format!("cdn/{version}/data/{}/champion.json", self.locale);
        let url = join_url(&self.base_url, &path)?;
        let context = format!("champion.json (version {version}, locale {})", self.locale);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            send_json(self.client.get(url.clone()), &context)
        })
        .await
    }
}

/// Turns one raw `data` entry into a snapshot, or a skip naming the entry key.
pub(crate) fn parse_champion_entry(
    key: &str,
    raw: serde_json::Value,
    source: &str,
    run_date: NaiveDate,
) -> EntityOutcome<EntitySnapshot> {
    let entry: ChampionEntry = match serde_json::from_value(raw) {
        Ok(entry) => entry,
        Err(e) => {
            return EntityOutcome::Skipped {
                entity_name: key.to_owned(),
                reason: format!("malformed entry: {e}"),
            }
        }
    };

    match EntitySnapshot::new(
        &entry.name,
        entry.info.difficulty,
        entry.tags,
        source,
        run_date,
    ) {
        Ok(snapshot) => EntityOutcome::Collected(snapshot),
        Err(e) => EntityOutcome::Skipped {
            entity_name: if entry.name.trim().is_empty() {
                key.to_owned()
            } else {
                entry.name
            },
            reason: e.to_string(),
        },
    }
}

#[async_trait]
impl ReferenceCollector for DataDragonCollector {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn collect(&self, run_date: NaiveDate) -> Result<Batch<EntitySnapshot>, ScraperError> {
        let version = self.latest_version().await?;
        tracing::info!(%version, locale = %self.locale, "fetching reference roster");

        let document = self.champion_document(&version).await?;
        if document.data.is_empty() {
            return Err(ScraperError::SourceUnavailable {
                source_name: SOURCE_NAME,
                reason: format!("champion.json for {version} has no entries"),
            });
        }

        let source = format!("{SOURCE_NAME}/{version}");
        let batch: Batch<EntitySnapshot> = document
            .data
            .into_iter()
            .map(|(key, raw)| parse_champion_entry(&key, raw, &source, run_date))
            .collect();

        for skipped in &batch.skipped {
            tracing::warn!(
                entity = %skipped.entity_name,
                reason = %skipped.reason,
                "skipping reference entry"
            );
        }

        if batch.all_skipped() {
            return Err(ScraperError::SourceUnavailable {
                source_name: SOURCE_NAME,
                reason: format!("all {} entries in champion.json were malformed", batch.attempted()),
            });
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn parses_well_formed_entry() {
        let raw = json!({
            "id": "Ahri",
            "name": "九尾妖狐",
            "info": { "attack": 3, "defense": 4, "magic": 8, "difficulty": 5 },
            "tags": ["Mage", "Assassin"]
        });
        let outcome = parse_champion_entry("Ahri", raw, "ddragon/14.1.1", date());
        let EntityOutcome::Collected(snapshot) = outcome else {
            panic!("expected collected, got {outcome:?}");
        };
        assert_eq!(snapshot.entity_name, "九尾妖狐");
        assert_eq!(snapshot.attribute_value, 5);
        assert_eq!(snapshot.tags, vec!["Mage", "Assassin"]);
        assert_eq!(snapshot.source, "ddragon/14.1.1");
        assert_eq!(snapshot.scrape_date, date());
    }

    #[test]
    fn missing_info_is_skipped_under_entry_key() {
        let raw = json!({ "name": "Broken", "tags": [] });
        let outcome = parse_champion_entry("Broken", raw, "ddragon/14.1.1", date());
        assert!(matches!(
            outcome,
            EntityOutcome::Skipped { ref entity_name, .. } if entity_name == "Broken"
        ));
    }

    #[test]
    fn difficulty_above_scale_is_skipped() {
        let raw = json!({ "name": "Overtuned", "info": { "difficulty": 11 }, "tags": [] });
        let outcome = parse_champion_entry("Overtuned", raw, "ddragon/14.1.1", date());
        let EntityOutcome::Skipped { reason, .. } = outcome else {
            panic!("expected skip");
        };
        assert!(reason.contains("out of range"), "reason: {reason}");
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let raw = json!({ "name": "Plain", "info": { "difficulty": 0 } });
        let outcome = parse_champion_entry("Plain", raw, "ddragon/14.1.1", date());
        let EntityOutcome::Collected(snapshot) = outcome else {
            panic!("expected collected");
        };
        assert!(snapshot.tags.is_empty());
        assert_eq!(snapshot.attribute_value, 0);
    }
}
