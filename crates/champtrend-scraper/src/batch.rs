//! Per-entity outcomes and the best-effort batch they fold into.

/// Result of collecting one entity: a record, or a skip with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome<T> {
    Collected(T),
    Skipped { entity_name: String, reason: String },
}

/// An entity left out of a batch and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub entity_name: String,
    pub reason: String,
}

/// Records a collector produced for one run, plus the entities it skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedEntity>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Batch<T> {
    /// Entities attempted, whether collected or skipped.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    /// `true` when at least one entity was attempted and none succeeded.
    #[must_use]
    pub fn all_skipped(&self) -> bool {
        self.records.is_empty() && !self.skipped.is_empty()
    }

    pub fn push(&mut self, outcome: EntityOutcome<T>) {
        match outcome {
            EntityOutcome::Collected(record) => self.records.push(record),
            EntityOutcome::Skipped {
                entity_name,
                reason,
            } => self.skipped.push(SkippedEntity {
                entity_name,
                reason,
            }),
        }
    }
}

impl<T> FromIterator<EntityOutcome<T>> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = EntityOutcome<T>>>(iter: I) -> Self {
        let mut batch = Batch::default();
        for outcome in iter {
            batch.push(outcome);
        }
        batch
    }
}
