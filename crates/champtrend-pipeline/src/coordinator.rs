//! One ingestion run: fetch and persist the reference set, then fetch and
//! persist the metric for the same roster, then notify.
//!
//! Stages run strictly in order and the first error ends the run. Entity
//! rows are committed before the metric fetch starts, so a metric failure
//! leaves that run's reference rows in the store. Nothing is retried here.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use champtrend_core::{RunResult, RunStage};
use champtrend_db::{append_entity_snapshots, append_metric_snapshots};
use champtrend_scraper::{MetricCollector, ReferenceCollector};

use crate::error::PipelineError;
use crate::notify::{notify_best_effort, Notifier};

pub struct Coordinator<'a> {
    reference: &'a dyn ReferenceCollector,
    metric: &'a dyn MetricCollector,
    notifier: &'a dyn Notifier,
}

impl<'a> Coordinator<'a> {
    #[must_use]
    pub fn new(
        reference: &'a dyn ReferenceCollector,
        metric: &'a dyn MetricCollector,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            reference,
            metric,
            notifier,
        }
    }

    /// Runs every stage for `run_date` and notifies the outcome.
    ///
    /// Every record written by this run carries `run_date`, whatever the wall
    /// clock says while the run is in flight.
    ///
    /// # Errors
    ///
    /// Returns the first stage error as a [`PipelineError`], after the
    /// failure has been logged and sent to the notifier.
    pub async fn run(
        &self,
        pool: &SqlitePool,
        run_date: NaiveDate,
    ) -> Result<RunResult, PipelineError> {
        tracing::info!(
            %run_date,
            reference = self.reference.source_name(),
            metric = self.metric.source_name(),
            notifier = self.notifier.channel_name(),
            "ingestion run started"
        );

        let mut result = RunResult::started(run_date);
        match self.execute(pool, run_date, &mut result).await {
            Ok(()) => {
                tracing::info!(
                    %run_date,
                    entities = result.entity_count,
                    metrics = result.metric_count,
                    skipped = result.skipped_count,
                    rows_written = result.rows_written,
                    "ingestion run succeeded"
                );
                notify_best_effort(self.notifier, &result).await;
                Ok(result)
            }
            Err(err) => {
                let stage = err.stage();
                let failed = result.into_failure(stage, err.to_string());
                tracing::error!(
                    %run_date,
                    %stage,
                    error = %err,
                    entities = failed.entity_count,
                    "ingestion run failed"
                );
                notify_best_effort(self.notifier, &failed).await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        pool: &SqlitePool,
        run_date: NaiveDate,
        result: &mut RunResult,
    ) -> Result<(), PipelineError> {
        let entities = self
            .reference
            .collect(run_date)
            .await
            .map_err(PipelineError::Reference)?;
        result.entity_count = entities.records.len();
        result.skipped_count += entities.skipped.len();
        tracing::info!(
            stage = %RunStage::FetchReference,
            collected = entities.records.len(),
            skipped = entities.skipped.len(),
            "stage complete"
        );

        let report = append_entity_snapshots(pool, &entities.records)
            .await
            .map_err(|source| PipelineError::Persist {
                stage: RunStage::PersistReference,
                source,
            })?;
        result.rows_written += report.written;
        tracing::info!(
            stage = %RunStage::PersistReference,
            written = report.written,
            duplicates = report.duplicates,
            "stage complete"
        );

        let roster: Vec<String> = entities
            .records
            .iter()
            .map(|snapshot| snapshot.entity_name.clone())
            .collect();

        let metrics = self
            .metric
            .collect(run_date, &roster)
            .await
            .map_err(PipelineError::Metric)?;
        result.metric_count = metrics.records.len();
        result.skipped_count += metrics.skipped.len();
        tracing::info!(
            stage = %RunStage::FetchMetric,
            collected = metrics.records.len(),
            skipped = metrics.skipped.len(),
            "stage complete"
        );

        let report = append_metric_snapshots(pool, &metrics.records)
            .await
            .map_err(|source| PipelineError::Persist {
                stage: RunStage::PersistMetric,
                source,
            })?;
        result.rows_written += report.written;
        tracing::info!(
            stage = %RunStage::PersistMetric,
            written = report.written,
            duplicates = report.duplicates,
            "stage complete"
        );

        Ok(())
    }
}
