//! Outcome of one ingestion run, handed to the notifier and the logs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stages of an ingestion run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    FetchReference,
    PersistReference,
    FetchMetric,
    PersistMetric,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStage::FetchReference => write!(f, "fetch_reference"),
            RunStage::PersistReference => write!(f, "persist_reference"),
            RunStage::FetchMetric => write!(f, "fetch_metric"),
            RunStage::PersistMetric => write!(f, "persist_metric"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Ephemeral summary of a run. Not persisted.
///
/// `entity_count` and `metric_count` are the records collected for
/// `run_date`; `rows_written` counts rows actually inserted, which is lower
/// when a run is repeated for the same date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_date: NaiveDate,
    pub status: RunStatus,
    pub entity_count: usize,
    pub metric_count: usize,
    pub skipped_count: usize,
    pub rows_written: u64,
    pub failed_stage: Option<RunStage>,
    pub error_detail: Option<String>,
}

impl RunResult {
    /// An in-progress result with zero counts, promoted to success or failure
    /// when the run ends.
    #[must_use]
    pub fn started(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            status: RunStatus::Success,
            entity_count: 0,
            metric_count: 0,
            skipped_count: 0,
            rows_written: 0,
            failed_stage: None,
            error_detail: None,
        }
    }

    #[must_use]
    pub fn into_failure(mut self, stage: RunStage, detail: String) -> Self {
        self.status = RunStatus::Failure;
        self.failed_stage = Some(stage);
        self.error_detail = Some(detail);
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
