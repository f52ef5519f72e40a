//! Week-keyed repositories with fallback-to-latest resolution
//!
//! Snapshots and narrative insights share one resolution policy but are held
//! in separate repositories, so numeric telemetry and narrative generation
//! can be sourced and refreshed independently.
//!
//! ## Resolution
//!
//! - Exact entry for the requested week: returned with `was_fallback = false`
//! - Otherwise: the entry with the highest known week, `was_fallback = true`
//!
//! Repositories are populated once and read-only afterwards. An empty
//! repository is rejected at construction time, so `resolve` always yields
//! a record.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{InsightRecord, KpiSnapshot, WeekId};

/// Records that belong to exactly one week
pub trait WeekKeyed {
    fn week(&self) -> WeekId;

    /// Reject records that cannot be served
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl WeekKeyed for KpiSnapshot {
    fn week(&self) -> WeekId {
        self.week
    }

    fn validate(&self) -> Result<()> {
        KpiSnapshot::validate(self)
    }
}

impl WeekKeyed for InsightRecord {
    fn week(&self) -> WeekId {
        self.week
    }
}

/// Outcome of a repository lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a, T> {
    /// Week of the record actually returned
    pub week: WeekId,
    pub record: &'a T,
    /// True when the requested week had no exact entry
    pub was_fallback: bool,
}

/// Immutable week-keyed store
#[derive(Debug, Clone)]
pub struct WeekRepository<T> {
    label: &'static str,
    records: BTreeMap<WeekId, T>,
}

pub type SnapshotRepository = WeekRepository<KpiSnapshot>;
pub type InsightRepository = WeekRepository<InsightRecord>;

impl<T: WeekKeyed> WeekRepository<T> {
    /// Build a repository from its full record set.
    ///
    /// Fails with a configuration error when `records` is empty and with
    /// invalid data when two records claim the same week or a record fails
    /// validation.
    pub fn new(label: &'static str, records: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for record in records {
            record.validate()?;
            let week = record.week();
            if map.insert(week, record).is_some() {
                return Err(Error::InvalidData(format!(
                    "{} repository has more than one record for {}",
                    label, week
                )));
            }
        }

        if map.is_empty() {
            tracing::warn!(repository = label, "Refusing to build empty repository");
            return Err(Error::Configuration(format!(
                "{} repository must be initialized with at least one record",
                label
            )));
        }

        tracing::debug!(repository = label, records = map.len(), "Repository loaded");
        Ok(Self {
            label,
            records: map,
        })
    }

    /// Resolve a week to a record, falling back to the latest known week
    pub fn resolve(&self, week: WeekId) -> Resolved<'_, T> {
        if let Some(record) = self.records.get(&week) {
            return Resolved {
                week,
                record,
                was_fallback: false,
            };
        }

        let (latest, record) = self.latest_entry();
        tracing::debug!(
            repository = self.label,
            requested = %week,
            resolved = %latest,
            "No exact entry, falling back to latest week"
        );
        Resolved {
            week: latest,
            record,
            was_fallback: true,
        }
    }

    /// Resolve the comparison baseline for `week`.
    ///
    /// Prefers the adjacent week; otherwise the closest earlier week
    /// (reported as a fallback). Returns `None` when nothing earlier exists.
    pub fn resolve_before(&self, week: WeekId) -> Option<Resolved<'_, T>> {
        if let Some(previous) = week.previous() {
            if let Some(record) = self.records.get(&previous) {
                return Some(Resolved {
                    week: previous,
                    record,
                    was_fallback: false,
                });
            }
        }

        self.records
            .range(..week)
            .next_back()
            .map(|(found, record)| Resolved {
                week: *found,
                record,
                was_fallback: true,
            })
    }

    /// Exact lookup without fallback
    pub fn get(&self, week: WeekId) -> Option<&T> {
        self.records.get(&week)
    }

    /// Known weeks, ascending
    pub fn weeks(&self) -> Vec<WeekId> {
        self.records.keys().copied().collect()
    }

    /// Highest known week
    pub fn latest(&self) -> WeekId {
        self.latest_entry().0
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed repository
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    fn latest_entry(&self) -> (WeekId, &T) {
        // Construction guarantees at least one record.
        let (week, record) = self
            .records
            .last_key_value()
            .unwrap_or_else(|| unreachable!("{} repository is never empty", self.label));
        (*week, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(n: u32) -> WeekId {
        WeekId::new(n).unwrap()
    }

    fn snapshot(n: u32, delivery: f64) -> KpiSnapshot {
        KpiSnapshot::new(week(n), [delivery, 98.0, 85.0, 70.0, 90.0])
    }

    fn repo() -> SnapshotRepository {
        WeekRepository::new(
            "snapshot",
            vec![snapshot(20, 94.2), snapshot(23, 91.4), snapshot(21, 96.1)],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_repository_is_configuration_error() {
        let result = SnapshotRepository::new("snapshot", Vec::new());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_duplicate_week_rejected() {
        let result =
            SnapshotRepository::new("snapshot", vec![snapshot(5, 90.0), snapshot(5, 91.0)]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_non_finite_snapshot_rejected() {
        let result = SnapshotRepository::new("snapshot", vec![snapshot(5, 90.0), snapshot(6, f64::NAN)]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_exact_match_is_not_fallback() {
        let repo = repo();
        for w in repo.weeks() {
            let resolved = repo.resolve(w);
            assert_eq!(resolved.week, w);
            assert_eq!(resolved.record.week, w);
            assert!(!resolved.was_fallback);
        }
    }

    #[test]
    fn test_missing_week_falls_back_to_latest() {
        let repo = repo();
        for missing in [1, 22, 24, 99] {
            let resolved = repo.resolve(week(missing));
            assert_eq!(resolved.week, week(23));
            assert_eq!(resolved.record.delivery_score, 91.4);
            assert!(resolved.was_fallback);
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let repo = repo();
        let first = repo.resolve(week(40));
        let second = repo.resolve(week(40));
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_before_adjacent() {
        let repo = repo();
        let baseline = repo.resolve_before(week(21)).unwrap();
        assert_eq!(baseline.week, week(20));
        assert!(!baseline.was_fallback);
    }

    #[test]
    fn test_resolve_before_skips_gap() {
        let repo = repo();
        let baseline = repo.resolve_before(week(23)).unwrap();
        assert_eq!(baseline.week, week(21));
        assert!(baseline.was_fallback);
    }

    #[test]
    fn test_resolve_before_earliest_has_no_baseline() {
        let repo = repo();
        assert!(repo.resolve_before(week(20)).is_none());
        assert!(repo.resolve_before(week(1)).is_none());
    }

    #[test]
    fn test_weeks_sorted_and_latest() {
        let repo = repo();
        assert_eq!(repo.weeks(), vec![week(20), week(21), week(23)]);
        assert_eq!(repo.latest(), week(23));
        assert_eq!(repo.len(), 3);
        assert!(!repo.is_empty());
    }
}
