//! Store maintenance commands.

use rand::{rngs::StdRng, SeedableRng};

/// # Errors
///
/// Returns an error if any migration fails.
pub(crate) async fn run_migrate(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    let applied = champtrend_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// # Errors
///
/// Returns an error if the store does not answer.
pub(crate) async fn run_ping(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    champtrend_db::ping(pool).await?;
    println!("database reachable");
    Ok(())
}

/// Backfills `days` synthetic days before today.
///
/// # Errors
///
/// Returns an error if either table is empty or an append fails.
pub(crate) async fn run_backfill(pool: &sqlx::SqlitePool, days: u32) -> anyhow::Result<()> {
    let anchor = chrono::Local::now().date_naive();
    let mut rng = StdRng::from_os_rng();

    let report = champtrend_db::backfill(pool, anchor, days, &mut rng)
        .await
        .map_err(|e| match e {
            champtrend_db::DbError::EmptySeed { table } => anyhow::anyhow!(
                "{table} is empty; run `champtrend run` first to create seed data"
            ),
            other => other.into(),
        })?;

    println!(
        "backfilled {} day(s): {} entity rows, {} metric rows",
        report.days, report.entity_rows_written, report.metric_rows_written
    );
    Ok(())
}
