//! Pure read-side math over joined rows and entity histories.

use crate::snapshots::{HistoryPoint, LatestRow};

/// Filters `rows` to `attribute_value >= min_attribute_value` and orders them
/// by `metric_value` descending, ties broken by `entity_name` ascending.
#[must_use]
pub fn rank_leaderboard(rows: Vec<LatestRow>, min_attribute_value: u8) -> Vec<LatestRow> {
    let mut ranked: Vec<LatestRow> = rows
        .into_iter()
        .filter(|r| r.attribute_value >= min_attribute_value)
        .collect();
    ranked.sort_by(|a, b| {
        b.metric_value
            .cmp(&a.metric_value)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    });
    ranked
}

/// The row with the highest `metric_value`, or `None` when there is no data.
///
/// Ties resolve to the alphabetically first entity, matching the leaderboard.
#[must_use]
pub fn top_entity(rows: &[LatestRow]) -> Option<&LatestRow> {
    rows.iter().min_by(|a, b| {
        b.metric_value
            .cmp(&a.metric_value)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    })
}

/// Percentage change between the earliest and latest history points.
///
/// `None` when there are fewer than two points or the earliest value is zero;
/// a zero baseline has no meaningful growth percentage.
#[must_use]
pub fn growth_rate(history: &[HistoryPoint]) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let earliest = history.iter().min_by_key(|p| p.scrape_date)?;
    let latest = history.iter().max_by_key(|p| p.scrape_date)?;
    if earliest.metric_value == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let (old, new) = (earliest.metric_value as f64, latest.metric_value as f64);
    Some((new - old) / old * 100.0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(name: &str, attribute_value: u8, metric_value: u64) -> LatestRow {
        LatestRow {
            entity_name: name.to_string(),
            attribute_value,
            tags: Vec::new(),
            metric_value,
            metric_recorded: true,
            scrape_date: date(1),
        }
    }

    fn point(day: u32, metric_value: u64) -> HistoryPoint {
        HistoryPoint {
            scrape_date: date(day),
            metric_value,
        }
    }

    #[test]
    fn leaderboard_filters_by_threshold() {
        let rows = vec![row("Ahri", 5, 10), row("Azir", 8, 5), row("Annie", 2, 99)];
        let ranked = rank_leaderboard(rows, 5);

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.attribute_value >= 5));
    }

    #[test]
    fn leaderboard_sorts_descending_with_name_tiebreak() {
        let rows = vec![
            row("Zed", 7, 100),
            row("Ahri", 5, 100),
            row("Lux", 5, 300),
            row("Garen", 1, 0),
        ];
        let names: Vec<String> = rank_leaderboard(rows, 0)
            .into_iter()
            .map(|r| r.entity_name)
            .collect();

        assert_eq!(names, vec!["Lux", "Ahri", "Zed", "Garen"]);
    }

    #[test]
    fn leaderboard_is_non_increasing_for_every_threshold() {
        let rows: Vec<LatestRow> = (0..=10u8)
            .map(|i| row(&format!("E{i}"), i, u64::from(i) * 37 % 11))
            .collect();
        for threshold in 0..=11u8 {
            let ranked = rank_leaderboard(rows.clone(), threshold);
            assert!(ranked.iter().all(|r| r.attribute_value >= threshold));
            assert!(ranked
                .windows(2)
                .all(|w| w[0].metric_value >= w[1].metric_value));
        }
    }

    #[test]
    fn top_entity_on_empty_is_none() {
        assert!(top_entity(&[]).is_none());
    }

    #[test]
    fn top_entity_picks_max_metric() {
        let rows = vec![row("Ahri", 5, 10), row("Yasuo", 10, 500), row("Lux", 5, 300)];
        assert_eq!(top_entity(&rows).unwrap().entity_name, "Yasuo");
    }

    #[test]
    fn top_entity_with_all_zero_metrics_still_returns_a_row() {
        let rows = vec![row("Aatrox", 6, 0)];
        assert_eq!(top_entity(&rows).unwrap().entity_name, "Aatrox");
    }

    #[test]
    fn growth_rate_between_first_and_last() {
        let history = vec![point(1, 100), point(5, 150)];
        let growth = growth_rate(&history).unwrap();
        assert!((growth - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn growth_rate_undefined_for_zero_baseline() {
        let history = vec![point(1, 0), point(5, 500)];
        assert!(growth_rate(&history).is_none());
    }

    #[test]
    fn growth_rate_undefined_for_single_point() {
        assert!(growth_rate(&[point(1, 100)]).is_none());
        assert!(growth_rate(&[]).is_none());
    }

    #[test]
    fn growth_rate_can_be_negative() {
        let history = vec![point(1, 200), point(3, 250), point(5, 100)];
        let growth = growth_rate(&history).unwrap();
        assert!((growth + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn growth_rate_uses_dates_not_slice_order() {
        let history = vec![point(5, 150), point(1, 100)];
        let growth = growth_rate(&history).unwrap();
        assert!((growth - 50.0).abs() < f64::EPSILON);
    }
}
