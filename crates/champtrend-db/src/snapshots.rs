//! Database operations for `entity_snapshots` and `metric_snapshots`.
//!
//! Both tables are append-only. Inserts that collide on
//! `(entity_name, scrape_date)` are skipped, so appending the same batch twice
//! leaves the tables unchanged.

use champtrend_core::{
    decode_tags, encode_tags, EntitySnapshot, HistoryPoint, LatestRow, MetricSnapshot,
    ObservedPoint,
};
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// The two snapshot tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTable {
    Entity,
    Metric,
}

impl SnapshotTable {
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            SnapshotTable::Entity => "entity_snapshots",
            SnapshotTable::Metric => "metric_snapshots",
        }
    }
}

/// Rows written and rows skipped as duplicates by one append call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendReport {
    pub written: u64,
    pub duplicates: u64,
}

#[derive(Debug, sqlx::FromRow)]
struct EntitySnapshotRow {
    entity_name: String,
    attribute_value: i64,
    tags: String,
    source: String,
    scrape_date: NaiveDate,
}

impl TryFrom<EntitySnapshotRow> for EntitySnapshot {
    type Error = DbError;

    fn try_from(row: EntitySnapshotRow) -> Result<Self, Self::Error> {
        let snapshot = EntitySnapshot::new(
            &row.entity_name,
            row.attribute_value,
            decode_tags(&row.tags),
            &row.source,
            row.scrape_date,
        )?;
        Ok(snapshot)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MetricSnapshotRow {
    entity_name: String,
    metric_value: i64,
    scrape_date: NaiveDate,
}

impl TryFrom<MetricSnapshotRow> for MetricSnapshot {
    type Error = DbError;

    fn try_from(row: MetricSnapshotRow) -> Result<Self, Self::Error> {
        Ok(MetricSnapshot {
            entity_name: row.entity_name,
            metric_value: metric_from_db(row.metric_value)?,
            scrape_date: row.scrape_date,
        })
    }
}

/// Entity snapshot left-joined with its same-day metric; `metric_value` is
/// `NULL` when no metric row exists.
#[derive(Debug, sqlx::FromRow)]
struct LatestJoinRow {
    entity_name: String,
    attribute_value: i64,
    tags: String,
    metric_value: Option<i64>,
    scrape_date: NaiveDate,
}

impl TryFrom<LatestJoinRow> for LatestRow {
    type Error = DbError;

    fn try_from(row: LatestJoinRow) -> Result<Self, Self::Error> {
        let attribute_value =
            u8::try_from(row.attribute_value).map_err(|_| DbError::OutOfRange {
                column: "attribute_value",
                value: i128::from(row.attribute_value),
            })?;
        let metric = row.metric_value.map(metric_from_db).transpose()?;

        Ok(LatestRow {
            entity_name: row.entity_name,
            attribute_value,
            tags: decode_tags(&row.tags),
            metric_value: metric.unwrap_or(0),
            metric_recorded: metric.is_some(),
            scrape_date: row.scrape_date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryJoinRow {
    scrape_date: NaiveDate,
    metric_value: Option<i64>,
}

fn metric_from_db(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::OutOfRange {
        column: "metric_value",
        value: i128::from(value),
    })
}

fn metric_to_db(value: u64) -> Result<i64, DbError> {
    i64::try_from(value).map_err(|_| DbError::OutOfRange {
        column: "metric_value",
        value: i128::from(value),
    })
}

// ---------------------------------------------------------------------------
// Append operations
// ---------------------------------------------------------------------------

/// Appends entity snapshots in a single transaction.
///
/// Records whose `(entity_name, scrape_date)` already exists are skipped and
/// counted in [`AppendReport::duplicates`]; existing rows are never modified.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the whole batch is rolled
/// back in that case.
pub async fn append_entity_snapshots(
    pool: &SqlitePool,
    records: &[EntitySnapshot],
) -> Result<AppendReport, DbError> {
    let mut tx = pool.begin().await?;
    let mut report = AppendReport::default();

    for record in records {
        let result = sqlx::query(
            "INSERT INTO entity_snapshots \
                 (entity_name, attribute_value, tags, source, scrape_date) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (entity_name, scrape_date) DO NOTHING",
        )
        .bind(&record.entity_name)
        .bind(i64::from(record.attribute_value))
        .bind(encode_tags(&record.tags))
        .bind(&record.source)
        .bind(record.scrape_date)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            report.duplicates += 1;
        } else {
            report.written += result.rows_affected();
        }
    }

    tx.commit().await?;

    if report.duplicates > 0 {
        tracing::debug!(
            table = "entity_snapshots",
            duplicates = report.duplicates,
            "skipped snapshots already present for their date"
        );
    }
    Ok(report)
}

/// Appends metric snapshots in a single transaction.
///
/// Same duplicate handling as [`append_entity_snapshots`].
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if a value does not fit the column, or
/// [`DbError::Sqlx`] if any insert fails; the whole batch is rolled back.
pub async fn append_metric_snapshots(
    pool: &SqlitePool,
    records: &[MetricSnapshot],
) -> Result<AppendReport, DbError> {
    let mut tx = pool.begin().await?;
    let mut report = AppendReport::default();

    for record in records {
        let result = sqlx::query(
            "INSERT INTO metric_snapshots (entity_name, metric_value, scrape_date) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT (entity_name, scrape_date) DO NOTHING",
        )
        .bind(&record.entity_name)
        .bind(metric_to_db(record.metric_value)?)
        .bind(record.scrape_date)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            report.duplicates += 1;
        } else {
            report.written += result.rows_affected();
        }
    }

    tx.commit().await?;

    if report.duplicates > 0 {
        tracing::debug!(
            table = "metric_snapshots",
            duplicates = report.duplicates,
            "skipped snapshots already present for their date"
        );
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// Returns the maximum `scrape_date` in `table`, or `None` when it is empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidDate`]
/// if the stored value is not an ISO date.
pub async fn latest_date(
    pool: &SqlitePool,
    table: SnapshotTable,
) -> Result<Option<NaiveDate>, DbError> {
    let sql = format!("SELECT MAX(scrape_date) FROM {}", table.table_name());
    let raw = sqlx::query_scalar::<_, Option<String>>(&sql)
        .fetch_one(pool)
        .await?;

    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| DbError::InvalidDate { value })
    })
    .transpose()
}

/// All entity snapshots stored for `date`, ordered by entity name.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored row is invalid.
pub async fn entity_snapshots_on(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<EntitySnapshot>, DbError> {
    let rows = sqlx::query_as::<_, EntitySnapshotRow>(
        "SELECT entity_name, attribute_value, tags, source, scrape_date \
         FROM entity_snapshots \
         WHERE scrape_date = ?1 \
         ORDER BY entity_name",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(EntitySnapshot::try_from).collect()
}

/// All metric snapshots stored for `date`, ordered by entity name.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored row is invalid.
pub async fn metric_snapshots_on(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<MetricSnapshot>, DbError> {
    let rows = sqlx::query_as::<_, MetricSnapshotRow>(
        "SELECT entity_name, metric_value, scrape_date \
         FROM metric_snapshots \
         WHERE scrape_date = ?1 \
         ORDER BY entity_name",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MetricSnapshot::try_from).collect()
}

/// The latest-date view: entity snapshots at the newest `scrape_date` of
/// `entity_snapshots`, left-joined with same-day metrics.
///
/// Entities without a metric row get `metric_value = 0` and
/// `metric_recorded = false`. `entity_filter` restricts the result to one
/// entity name. Rows are ordered by entity name.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored row is invalid.
pub async fn query_latest(
    pool: &SqlitePool,
    entity_filter: Option<&str>,
) -> Result<Vec<LatestRow>, DbError> {
    let rows = sqlx::query_as::<_, LatestJoinRow>(
        "SELECT e.entity_name, e.attribute_value, e.tags, m.metric_value, e.scrape_date \
         FROM entity_snapshots e \
         LEFT JOIN metric_snapshots m \
             ON m.entity_name = e.entity_name AND m.scrape_date = e.scrape_date \
         WHERE e.scrape_date = (SELECT MAX(scrape_date) FROM entity_snapshots) \
           AND (?1 IS NULL OR e.entity_name = ?1) \
         ORDER BY e.entity_name",
    )
    .bind(entity_filter)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LatestRow::try_from).collect()
}

/// Gap-preserving history for one entity, ascending by date.
///
/// One point per entity snapshot date; `metric_value` is `None` where no
/// metric row exists for that date.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored value is invalid.
pub async fn query_history_observed(
    pool: &SqlitePool,
    entity_name: &str,
) -> Result<Vec<ObservedPoint>, DbError> {
    let rows = sqlx::query_as::<_, HistoryJoinRow>(
        "SELECT e.scrape_date, m.metric_value \
         FROM entity_snapshots e \
         LEFT JOIN metric_snapshots m \
             ON m.entity_name = e.entity_name AND m.scrape_date = e.scrape_date \
         WHERE e.entity_name = ?1 \
         ORDER BY e.scrape_date ASC",
    )
    .bind(entity_name)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(ObservedPoint {
                scrape_date: row.scrape_date,
                metric_value: row.metric_value.map(metric_from_db).transpose()?,
            })
        })
        .collect()
}

/// History for one entity, ascending by date, with missing metrics
/// reported as `0`.
///
/// This conflates "not measured" with "measured as zero"; use
/// [`query_history_observed`] to keep the distinction.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored value is invalid.
pub async fn query_history(
    pool: &SqlitePool,
    entity_name: &str,
) -> Result<Vec<HistoryPoint>, DbError> {
    let observed = query_history_observed(pool, entity_name).await?;
    Ok(observed.into_iter().map(HistoryPoint::from).collect())
}
