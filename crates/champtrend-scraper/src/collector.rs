//! Collector seams used by the ingestion coordinator.

use async_trait::async_trait;
use chrono::NaiveDate;

use champtrend_core::{EntitySnapshot, MetricSnapshot};

use crate::batch::Batch;
use crate::error::ScraperError;

/// Fetches the reference attribute set for every entity.
///
/// Every record in the returned batch is stamped with `run_date`.
#[async_trait]
pub trait ReferenceCollector: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns a [`ScraperError`] on a source-level failure. Per-entity
    /// problems are reported as skips inside the batch instead.
    async fn collect(&self, run_date: NaiveDate) -> Result<Batch<EntitySnapshot>, ScraperError>;
}

/// Fetches one popularity metric per entity in `entities`.
#[async_trait]
pub trait MetricCollector: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns a [`ScraperError`] on a source-level failure, including the
    /// case where every attempted entity was skipped.
    async fn collect(
        &self,
        run_date: NaiveDate,
        entities: &[String],
    ) -> Result<Batch<MetricSnapshot>, ScraperError>;
}
