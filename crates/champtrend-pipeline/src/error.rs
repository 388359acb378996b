use champtrend_core::RunStage;
use champtrend_db::DbError;
use champtrend_scraper::ScraperError;
use thiserror::Error;

/// A failed ingestion run, carrying the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reference collection failed: {0}")]
    Reference(#[source] ScraperError),

    #[error("metric collection failed: {0}")]
    Metric(#[source] ScraperError),

    #[error("{stage} failed: {source}")]
    Persist {
        stage: RunStage,
        #[source]
        source: DbError,
    },
}

impl PipelineError {
    #[must_use]
    pub fn stage(&self) -> RunStage {
        match self {
            PipelineError::Reference(_) => RunStage::FetchReference,
            PipelineError::Metric(_) => RunStage::FetchMetric,
            PipelineError::Persist { stage, .. } => *stage,
        }
    }
}
