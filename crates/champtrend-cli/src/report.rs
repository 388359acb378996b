//! Read-side commands: leaderboard, history and the raw latest view.

use champtrend_core::{growth_rate, top_entity, HistoryPoint, LatestRow};

/// # Errors
///
/// Returns an error if the leaderboard query fails.
pub(crate) async fn print_leaderboard(
    pool: &sqlx::SqlitePool,
    min_difficulty: u8,
) -> anyhow::Result<()> {
    let rows = champtrend_db::current_leaderboard(pool, min_difficulty).await?;

    let Some(first) = rows.first() else {
        println!("no data: no entities with difficulty >= {min_difficulty}");
        return Ok(());
    };
    println!("data as of {}", first.scrape_date);

    if let Some(top) = top_entity(&rows) {
        println!(
            "top entity: {} ({} views, difficulty {})",
            top.entity_name, top.metric_value, top.attribute_value
        );
    }
    println!();
    println!(
        "{:>4}  {:<20} {:>10} {:>12}  tags",
        "rank", "entity", "difficulty", "views"
    );
    for (index, row) in rows.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>10} {:>12}  {}",
            index + 1,
            row.entity_name,
            row.attribute_value,
            format_metric(row),
            row.tags.join(",")
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the history query fails.
pub(crate) async fn print_history(
    pool: &sqlx::SqlitePool,
    entity_name: &str,
    gaps: bool,
) -> anyhow::Result<()> {
    let observed = champtrend_db::query_history_observed(pool, entity_name).await?;
    if observed.is_empty() {
        println!("no history for {entity_name}");
        return Ok(());
    }

    for point in &observed {
        let value = match point.metric_value {
            Some(v) => v.to_string(),
            None if gaps => "-".to_owned(),
            None => "0".to_owned(),
        };
        println!("{}  {value:>12}", point.scrape_date);
    }

    let history: Vec<HistoryPoint> = observed.into_iter().map(HistoryPoint::from).collect();
    match growth_rate(&history) {
        Some(rate) => println!("growth: {rate:.1}%"),
        None => println!("growth: n/a"),
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the latest-view query fails.
pub(crate) async fn print_latest(
    pool: &sqlx::SqlitePool,
    entity_filter: Option<&str>,
) -> anyhow::Result<()> {
    let rows = champtrend_db::query_latest(pool, entity_filter).await?;
    if rows.is_empty() {
        println!("no data");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}  {:<20} {:>3} {:>12}  {}",
            row.scrape_date,
            row.entity_name,
            row.attribute_value,
            format_metric(row),
            row.tags.join(",")
        );
    }
    Ok(())
}

/// Marks zero-filled metrics so they are not mistaken for measured zeros.
fn format_metric(row: &LatestRow) -> String {
    if row.metric_recorded {
        row.metric_value.to_string()
    } else {
        format!("{}*", row.metric_value)
    }
}
