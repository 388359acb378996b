//! Leaderboard over the latest-date view.

use champtrend_core::{rank_leaderboard, LatestRow};
use sqlx::SqlitePool;

use crate::{query_latest, DbError};

/// Latest-date rows with `attribute_value >= min_attribute_value`, sorted by
/// `metric_value` descending and then `entity_name` ascending.
///
/// Entities with no metric row for the latest date are included with a
/// zero metric.
///
/// # Errors
///
/// Returns [`DbError`] if the underlying latest-view query fails.
pub async fn current_leaderboard(
    pool: &SqlitePool,
    min_attribute_value: u8,
) -> Result<Vec<LatestRow>, DbError> {
    let rows = query_latest(pool, None).await?;
    Ok(rank_leaderboard(rows, min_attribute_value))
}
