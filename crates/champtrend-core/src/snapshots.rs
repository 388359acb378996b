//! Snapshot records and the joined read-side row shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tags::normalize_tags;
use crate::CoreError;

/// Upper bound of the reference attribute scale (difficulty 0–10).
pub const MAX_ATTRIBUTE_VALUE: u8 = 10;

/// One reference-attribute record for one entity on one date.
///
/// Unique on `(entity_name, scrape_date)`. Never updated once written; a later
/// date's row supersedes it in "latest" views while this row stays available
/// for trend queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_name: String,
    pub attribute_value: u8,
    pub tags: Vec<String>,
    pub source: String,
    pub scrape_date: NaiveDate,
}

impl EntitySnapshot {
    /// Builds a snapshot, validating the name and attribute range and
    /// de-duplicating tags while keeping their original order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyEntityName`] for a blank name and
    /// [`CoreError::AttributeOutOfRange`] when `attribute_value` is outside
    /// `0..=MAX_ATTRIBUTE_VALUE`.
    pub fn new(
        entity_name: &str,
        attribute_value: i64,
        tags: impl IntoIterator<Item = String>,
        source: &str,
        scrape_date: NaiveDate,
    ) -> Result<Self, CoreError> {
        let entity_name = entity_name.trim();
        if entity_name.is_empty() {
            return Err(CoreError::EmptyEntityName);
        }

        let attribute_value = u8::try_from(attribute_value)
            .ok()
            .filter(|v| *v <= MAX_ATTRIBUTE_VALUE)
            .ok_or_else(|| CoreError::AttributeOutOfRange {
                entity_name: entity_name.to_string(),
                value: attribute_value,
                max: MAX_ATTRIBUTE_VALUE,
            })?;

        Ok(Self {
            entity_name: entity_name.to_string(),
            attribute_value,
            tags: normalize_tags(tags),
            source: source.to_string(),
            scrape_date,
        })
    }
}

/// One popularity-metric record for one entity on one date.
///
/// A missing row for an `(entity, date)` pair means "unknown", which is not
/// the same thing as a stored `metric_value` of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub entity_name: String,
    pub metric_value: u64,
    pub scrape_date: NaiveDate,
}

/// A row of the latest-date view: entity snapshot left-joined with the
/// metric snapshot of the same entity and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestRow {
    pub entity_name: String,
    pub attribute_value: u8,
    pub tags: Vec<String>,
    /// Zero when no metric row exists for this entity and date.
    pub metric_value: u64,
    /// `false` when `metric_value` was zero-filled.
    pub metric_recorded: bool,
    pub scrape_date: NaiveDate,
}

/// One point of a zero-filled entity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub scrape_date: NaiveDate,
    pub metric_value: u64,
}

/// One point of a gap-preserving entity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub scrape_date: NaiveDate,
    pub metric_value: Option<u64>,
}

impl From<ObservedPoint> for HistoryPoint {
    fn from(point: ObservedPoint) -> Self {
        Self {
            scrape_date: point.scrape_date,
            metric_value: point.metric_value.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn new_trims_name_and_dedupes_tags() {
        let snap = EntitySnapshot::new(
            "  Aatrox ",
            8,
            ["Fighter".to_string(), "Tank".to_string(), "Fighter".to_string()],
            "ddragon/14.1.1",
            day(),
        )
        .unwrap();

        assert_eq!(snap.entity_name, "Aatrox");
        assert_eq!(snap.attribute_value, 8);
        assert_eq!(snap.tags, vec!["Fighter", "Tank"]);
    }

    #[test]
    fn new_rejects_empty_name() {
        let result = EntitySnapshot::new("   ", 3, Vec::new(), "test", day());
        assert!(matches!(result, Err(CoreError::EmptyEntityName)));
    }

    #[test]
    fn new_rejects_attribute_above_scale() {
        let result = EntitySnapshot::new("Ahri", 11, Vec::new(), "test", day());
        assert!(matches!(
            result,
            Err(CoreError::AttributeOutOfRange { value: 11, .. })
        ));
    }

    #[test]
    fn new_rejects_negative_attribute() {
        let result = EntitySnapshot::new("Ahri", -1, Vec::new(), "test", day());
        assert!(matches!(
            result,
            Err(CoreError::AttributeOutOfRange { value: -1, .. })
        ));
    }

    #[test]
    fn observed_gap_zero_fills_into_history_point() {
        let point = ObservedPoint {
            scrape_date: day(),
            metric_value: None,
        };
        assert_eq!(HistoryPoint::from(point).metric_value, 0);
    }
}
