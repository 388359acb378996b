//! Synthetic history for local development.
//!
//! Copies the newest snapshot of each table onto the `days` dates before an
//! anchor date, jittering metric values by ±15%. The generated rows go through
//! the normal append path, so dates that already have data are left alone.

use champtrend_core::{EntitySnapshot, MetricSnapshot};
use chrono::{Days, NaiveDate};
use rand::Rng;
use sqlx::SqlitePool;

use crate::snapshots::{
    append_entity_snapshots, append_metric_snapshots, entity_snapshots_on, latest_date,
    metric_snapshots_on, SnapshotTable,
};
use crate::DbError;

const MIN_VARIANCE: f64 = 0.85;
const MAX_VARIANCE: f64 = 1.15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub days: u32,
    pub entity_rows_written: u64,
    pub metric_rows_written: u64,
}

/// Writes synthetic snapshots for `anchor - 1` through `anchor - days`.
///
/// # Errors
///
/// Returns [`DbError::EmptySeed`] if either table has no rows to copy, or
/// [`DbError`] if a query or append fails.
pub async fn backfill<R: Rng>(
    pool: &SqlitePool,
    anchor: NaiveDate,
    days: u32,
    rng: &mut R,
) -> Result<BackfillReport, DbError> {
    let entity_seed_date = latest_date(pool, SnapshotTable::Entity)
        .await?
        .ok_or(DbError::EmptySeed {
            table: "entity_snapshots",
        })?;
    let metric_seed_date = latest_date(pool, SnapshotTable::Metric)
        .await?
        .ok_or(DbError::EmptySeed {
            table: "metric_snapshots",
        })?;

    let entity_seed = entity_snapshots_on(pool, entity_seed_date).await?;
    let metric_seed = metric_snapshots_on(pool, metric_seed_date).await?;
    tracing::info!(
        entity_seed = entity_seed.len(),
        metric_seed = metric_seed.len(),
        %entity_seed_date,
        %metric_seed_date,
        "loaded backfill seed"
    );

    let mut entities: Vec<EntitySnapshot> = Vec::new();
    let mut metrics: Vec<MetricSnapshot> = Vec::new();

    for offset in 1..=days {
        let Some(date) = anchor.checked_sub_days(Days::new(u64::from(offset))) else {
            break;
        };
        tracing::debug!(%date, "generating synthetic snapshots");

        entities.extend(entity_seed.iter().map(|e| EntitySnapshot {
            scrape_date: date,
            ..e.clone()
        }));
        metrics.extend(metric_seed.iter().map(|m| MetricSnapshot {
            entity_name: m.entity_name.clone(),
            metric_value: jitter(m.metric_value, rng),
            scrape_date: date,
        }));
    }

    let entity_report = append_entity_snapshots(pool, &entities).await?;
    let metric_report = append_metric_snapshots(pool, &metrics).await?;

    Ok(BackfillReport {
        days,
        entity_rows_written: entity_report.written,
        metric_rows_written: metric_report.written,
    })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jitter<R: Rng>(value: u64, rng: &mut R) -> u64 {
    let factor = rng.random_range(MIN_VARIANCE..=MAX_VARIANCE);
    (value as f64 * factor) as u64
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn jitter_stays_within_fifteen_percent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let v = jitter(10_000, &mut rng);
            assert!((8_499..=11_500).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn jitter_of_zero_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(jitter(0, &mut rng), 0);
    }
}
