//! The default command: one ingestion run for today.

use chrono::NaiveDate;
use reqwest::Client;

use champtrend_core::{AppConfig, RunResult, RunStage};
use champtrend_pipeline::{
    notifier_from_config, notify_best_effort, render_message, Coordinator, Notifier,
};
use champtrend_scraper::{build_http_client, BilibiliCollector, DataDragonCollector};

/// Runs both collectors for today's date and stores the result.
///
/// The run date is read from the local clock once, here, and passed through
/// every stage. Only a failure to build the HTTP client goes unnotified,
/// since the webhook needs that client.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, a collector cannot be
/// built or any stage fails. The failure has already been logged and
/// notified by then.
pub(crate) async fn run_ingestion(config: &AppConfig) -> anyhow::Result<()> {
    let run_date = chrono::Local::now().date_naive();

    let client = build_http_client(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
    let notifier = notifier_from_config(config, client.clone());

    let result = ingest(config, client, notifier.as_ref(), run_date).await?;
    println!("{}", render_message(&result));
    Ok(())
}

/// Everything after the notifier exists. Setup failures before
/// [`Coordinator::run`] are reported under the stage they block.
async fn ingest(
    config: &AppConfig,
    client: Client,
    notifier: &dyn Notifier,
    run_date: NaiveDate,
) -> anyhow::Result<RunResult> {
    let reference = match DataDragonCollector::from_config(client.clone(), config) {
        Ok(collector) => collector,
        Err(e) => {
            return Err(
                fail_run_best_effort(notifier, run_date, RunStage::FetchReference, e.into()).await,
            )
        }
    };
    let metric = match BilibiliCollector::from_config(client, config) {
        Ok(collector) => collector,
        Err(e) => {
            return Err(
                fail_run_best_effort(notifier, run_date, RunStage::FetchMetric, e.into()).await,
            )
        }
    };

    let pool = match open_store(config).await {
        Ok(pool) => pool,
        Err(e) => {
            return Err(
                fail_run_best_effort(notifier, run_date, RunStage::PersistReference, e).await,
            )
        }
    };

    let outcome = Coordinator::new(&reference, &metric, notifier)
        .run(&pool, run_date)
        .await;

    // The store is released on every path, including failed runs.
    pool.close().await;
    Ok(outcome?)
}

async fn open_store(config: &AppConfig) -> anyhow::Result<sqlx::SqlitePool> {
    let pool_config = champtrend_db::PoolConfig::from_app_config(config);
    let pool = champtrend_db::connect_pool(&config.database_url, pool_config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open store: {e}"))?;

    if let Err(e) = champtrend_db::run_migrations(&pool).await {
        pool.close().await;
        return Err(anyhow::anyhow!("failed to migrate store: {e}"));
    }
    Ok(pool)
}

/// Logs and notifies a run that failed before the coordinator started, then
/// hands back the original error.
async fn fail_run_best_effort(
    notifier: &dyn Notifier,
    run_date: NaiveDate,
    stage: RunStage,
    err: anyhow::Error,
) -> anyhow::Error {
    let failed = RunResult::started(run_date).into_failure(stage, err.to_string());
    tracing::error!(%run_date, %stage, error = %err, "ingestion run failed during setup");
    notify_best_effort(notifier, &failed).await;
    err
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use champtrend_core::{build_app_config, RunStatus};
    use champtrend_pipeline::NotifyError;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<RunResult>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, result: &RunResult) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(result.clone());
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "recording"
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn config(vars: &[(&str, String)]) -> AppConfig {
        build_app_config(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .ok_or(std::env::VarError::NotPresent)
        })
        .expect("valid test config")
    }

    fn client() -> Client {
        build_http_client(1, "champtrend-test/0.1").expect("failed to build client")
    }

    #[tokio::test]
    async fn unopenable_store_is_notified_as_persist_failure() {
        let missing = std::env::temp_dir()
            .join("champtrend-no-such-dir")
            .join("nested")
            .join("store.db");
        let config = config(&[("DATABASE_URL", format!("sqlite://{}", missing.display()))]);
        let notifier = RecordingNotifier::default();

        let err = ingest(&config, client(), &notifier, run_date())
            .await
            .expect_err("store in a missing directory cannot be opened");
        assert!(err.to_string().contains("failed to open store"), "{err}");

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].status, RunStatus::Failure);
        assert_eq!(sent[0].failed_stage, Some(RunStage::PersistReference));
        assert_eq!(sent[0].run_date, run_date());
    }

    #[tokio::test]
    async fn bad_reference_url_is_notified_before_any_request() {
        let config = config(&[("CHAMPTREND_REFERENCE_BASE_URL", "not a url".to_owned())]);
        let notifier = RecordingNotifier::default();

        ingest(&config, client(), &notifier, run_date())
            .await
            .expect_err("reference collector cannot be built");

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].failed_stage, Some(RunStage::FetchReference));
        assert!(
            sent[0]
                .error_detail
                .as_deref()
                .is_some_and(|d| d.contains("not a url")),
            "{:?}",
            sent[0].error_detail
        );
    }

    #[tokio::test]
    async fn bad_metric_url_is_notified_as_metric_failure() {
        let config = config(&[("CHAMPTREND_METRIC_BASE_URL", "::".to_owned())]);
        let notifier = RecordingNotifier::default();

        ingest(&config, client(), &notifier, run_date())
            .await
            .expect_err("metric collector cannot be built");

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].failed_stage, Some(RunStage::FetchMetric));
    }
}
