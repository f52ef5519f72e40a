//! KPI Engine - resolves, compares and classifies a selected week
//!
//! Control flow for one request:
//!
//! 1. Resolve the current snapshot (exact or fallback-to-latest)
//! 2. Resolve the baseline: the adjacent week, else the closest earlier week.
//!    The baseline must precede both the requested week and the resolved
//!    snapshot, so a fallback to a later week has no baseline.
//! 3. Compute deltas and classify them
//! 4. Resolve the narrative insight for the same week and rank its recommendations
//!
//! Both repositories are read-only after construction, so an engine can be
//! shared freely between readers without locking.

use serde::Serialize;

use crate::analysis::{
    compare, metric_tree, multi_week_root_cause, root_cause, AlertClassifier, Classification,
    LoadModel, LoadSimulationReport, MetricTree, RootCauseReport,
};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::insights::{InsertionOrderRanker, RecommendationRanker};
use crate::models::{AlertStatus, InsightRecord, KpiSnapshot, Metric, MetricDelta, Rating, WeekId};
use crate::repository::{InsightRepository, SnapshotRepository, WeekRepository};
use crate::source::Dataset;

/// Everything the presentation layer needs to show one week's KPIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub requested_week: WeekId,
    pub snapshot: KpiSnapshot,
    pub previous_snapshot: Option<KpiSnapshot>,
    /// Empty when there is no baseline
    pub deltas: Vec<MetricDelta>,
    pub ratings: Vec<(Metric, Rating)>,
    #[serde(flatten)]
    pub classification: Classification,
    pub snapshot_was_fallback: bool,
    pub previous_was_fallback: bool,
}

impl Comparison {
    pub fn aggregate_status(&self) -> AlertStatus {
        self.classification.aggregate
    }

    pub fn has_baseline(&self) -> bool {
        self.classification.has_baseline
    }

    pub fn status(&self, metric: Metric) -> AlertStatus {
        self.classification.status(metric)
    }

    pub fn delta(&self, metric: Metric) -> Option<&MetricDelta> {
        self.deltas.iter().find(|d| d.metric == metric)
    }

    /// True when the result should carry a degraded-data disclosure
    pub fn is_degraded(&self) -> bool {
        self.snapshot_was_fallback || self.previous_was_fallback || !self.has_baseline()
    }
}

/// Narrative insight for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightView {
    pub requested_week: WeekId,
    pub record: InsightRecord,
    pub was_fallback: bool,
    pub ranked_recommendations: Vec<String>,
}

/// Root-cause breakdown for a requested week, with how its pair was resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootCauseView {
    pub requested_week: WeekId,
    pub snapshot_week: WeekId,
    pub snapshot_was_fallback: bool,
    pub previous_week: Option<WeekId>,
    pub previous_was_fallback: bool,
    /// `None` without a baseline
    pub report: Option<RootCauseReport>,
}

impl RootCauseView {
    pub fn is_degraded(&self) -> bool {
        self.snapshot_was_fallback || self.previous_was_fallback || self.report.is_none()
    }
}

/// A single-snapshot report and the week it was computed for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekReport<T> {
    pub requested_week: WeekId,
    pub week: WeekId,
    pub was_fallback: bool,
    pub report: T,
}

pub struct KpiEngine {
    snapshots: SnapshotRepository,
    insights: InsightRepository,
    classifier: AlertClassifier,
    load_model: LoadModel,
    ranker: Box<dyn RecommendationRanker>,
}

impl KpiEngine {
    pub fn new(
        snapshots: SnapshotRepository,
        insights: InsightRepository,
        config: EngineConfig,
    ) -> Self {
        Self {
            snapshots,
            insights,
            classifier: config.classifier,
            load_model: config.simulation,
            ranker: Box::new(InsertionOrderRanker),
        }
    }

    /// Build both repositories from a dataset.
    ///
    /// Fails with a configuration error if either side is empty.
    pub fn from_dataset(dataset: Dataset, config: EngineConfig) -> Result<Self> {
        let snapshots = WeekRepository::new("snapshot", dataset.snapshots)?;
        let insights = WeekRepository::new("insight", dataset.insights)?;
        Ok(Self::new(snapshots, insights, config))
    }

    /// Replace the recommendation ranker
    pub fn with_ranker(mut self, ranker: Box<dyn RecommendationRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn snapshots(&self) -> &SnapshotRepository {
        &self.snapshots
    }

    pub fn insights(&self) -> &InsightRepository {
        &self.insights
    }

    pub fn classifier(&self) -> &AlertClassifier {
        &self.classifier
    }

    pub fn load_model(&self) -> &LoadModel {
        &self.load_model
    }

    pub fn ranker_name(&self) -> &'static str {
        self.ranker.name()
    }

    /// Compare the requested week against its baseline
    pub fn get_comparison(&self, week: WeekId) -> Comparison {
        let current = self.snapshots.resolve(week);
        let previous = self.snapshots.resolve_before(week.min(current.week));

        let ratings = Metric::ALL
            .iter()
            .map(|&m| (m, Rating::for_value(current.record.value(m))))
            .collect();

        let (deltas, classification, previous_snapshot, previous_was_fallback) = match previous {
            Some(baseline) => {
                let deltas = compare(current.record, baseline.record);
                let classification = self.classifier.classify(&deltas);
                (
                    deltas,
                    classification,
                    Some(baseline.record.clone()),
                    baseline.was_fallback,
                )
            }
            None => {
                tracing::debug!(week = %current.week, "No baseline snapshot available");
                (Vec::new(), Classification::no_baseline(), None, false)
            }
        };

        tracing::info!(
            requested = %week,
            resolved = %current.week,
            snapshot_fallback = current.was_fallback,
            previous_fallback = previous_was_fallback,
            has_baseline = classification.has_baseline,
            status = %classification.aggregate,
            "Comparison computed"
        );

        Comparison {
            requested_week: week,
            snapshot: current.record.clone(),
            previous_snapshot,
            deltas,
            ratings,
            classification,
            snapshot_was_fallback: current.was_fallback,
            previous_was_fallback,
        }
    }

    /// Narrative insight for the requested week
    pub fn get_insight(&self, week: WeekId) -> InsightView {
        let resolved = self.insights.resolve(week);
        let ranked_recommendations = self.ranker.rank(&resolved.record.recommendations);

        tracing::debug!(
            requested = %week,
            resolved = %resolved.week,
            fallback = resolved.was_fallback,
            ranker = self.ranker.name(),
            "Insight resolved"
        );

        InsightView {
            requested_week: week,
            record: resolved.record.clone(),
            was_fallback: resolved.was_fallback,
            ranked_recommendations,
        }
    }

    /// Delivery root-cause breakdown for the requested week
    pub fn get_root_cause(&self, week: WeekId) -> RootCauseView {
        let current = self.snapshots.resolve(week);
        let previous = self.snapshots.resolve_before(week.min(current.week));

        RootCauseView {
            requested_week: week,
            snapshot_week: current.week,
            snapshot_was_fallback: current.was_fallback,
            previous_week: previous.as_ref().map(|p| p.week),
            previous_was_fallback: previous.as_ref().is_some_and(|p| p.was_fallback),
            report: previous.map(|p| root_cause(current.record, p.record)),
        }
    }

    /// Metric tree and level alerts for the requested week
    pub fn get_metric_tree(&self, week: WeekId) -> WeekReport<MetricTree> {
        self.for_snapshot(week, metric_tree)
    }

    /// Simulate each order increase (percent) against the requested week
    pub fn simulate_load(
        &self,
        week: WeekId,
        increments: &[f64],
    ) -> Result<WeekReport<LoadSimulationReport>> {
        self.try_for_snapshot(week, |s| self.load_model.simulate_range(s, increments))
    }

    /// Step the order increase until `max_increase` percent
    pub fn stress_test(
        &self,
        week: WeekId,
        step: f64,
        max_increase: f64,
    ) -> Result<WeekReport<LoadSimulationReport>> {
        self.try_for_snapshot(week, |s| self.load_model.stress_test(s, step, max_increase))
    }

    fn for_snapshot<T>(&self, week: WeekId, f: impl FnOnce(&KpiSnapshot) -> T) -> WeekReport<T> {
        let resolved = self.snapshots.resolve(week);
        WeekReport {
            requested_week: week,
            week: resolved.week,
            was_fallback: resolved.was_fallback,
            report: f(resolved.record),
        }
    }

    fn try_for_snapshot<T>(
        &self,
        week: WeekId,
        f: impl FnOnce(&KpiSnapshot) -> Result<T>,
    ) -> Result<WeekReport<T>> {
        let resolved = self.snapshots.resolve(week);
        Ok(WeekReport {
            requested_week: week,
            week: resolved.week,
            was_fallback: resolved.was_fallback,
            report: f(resolved.record)?,
        })
    }

    /// Root-cause reports for every consecutive pair of known weeks
    pub fn trend(&self) -> Vec<RootCauseReport> {
        let ordered: Vec<&KpiSnapshot> = self.snapshots.iter().collect();
        multi_week_root_cause(&ordered)
    }

    /// Known snapshot weeks, ascending
    pub fn weeks(&self) -> Vec<WeekId> {
        self.snapshots.weeks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::seed_dataset;

    fn week(n: u32) -> WeekId {
        WeekId::new(n).unwrap()
    }

    fn seed_engine() -> KpiEngine {
        KpiEngine::from_dataset(seed_dataset().unwrap(), EngineConfig::default()).unwrap()
    }

    struct ReverseRanker;

    impl RecommendationRanker for ReverseRanker {
        fn name(&self) -> &'static str {
            "reverse"
        }

        fn rank(&self, recommendations: &[String]) -> Vec<String> {
            recommendations.iter().rev().cloned().collect()
        }
    }

    #[test]
    fn test_empty_dataset_fails_construction() {
        let result = KpiEngine::from_dataset(Dataset::default(), EngineConfig::default());
        assert!(matches!(result, Err(crate::Error::Configuration(_))));
    }

    #[test]
    fn test_comparison_exact_week() {
        let engine = seed_engine();
        let comparison = engine.get_comparison(week(23));

        assert_eq!(comparison.snapshot.week, week(23));
        assert_eq!(comparison.previous_snapshot.as_ref().unwrap().week, week(22));
        assert!(!comparison.snapshot_was_fallback);
        assert!(!comparison.previous_was_fallback);
        assert!(comparison.has_baseline());
        assert!(!comparison.is_degraded());
        assert_eq!(comparison.deltas.len(), 5);
        assert_eq!(comparison.ratings.len(), 5);
    }

    #[test]
    fn test_comparison_fallback_week() {
        let engine = seed_engine();
        let comparison = engine.get_comparison(week(30));

        assert_eq!(comparison.requested_week, week(30));
        assert_eq!(comparison.snapshot.week, week(23));
        assert!(comparison.snapshot_was_fallback);
        assert!(comparison.is_degraded());
    }

    #[test]
    fn test_earliest_week_has_no_baseline() {
        let engine = seed_engine();
        let comparison = engine.get_comparison(week(20));

        assert!(!comparison.has_baseline());
        assert!(comparison.previous_snapshot.is_none());
        assert!(comparison.deltas.is_empty());
        assert_eq!(comparison.aggregate_status(), AlertStatus::Normal);
    }

    #[test]
    fn test_fallback_to_later_week_has_no_baseline() {
        let engine = seed_engine();
        let comparison = engine.get_comparison(week(3));

        assert_eq!(comparison.snapshot.week, week(23));
        assert!(comparison.snapshot_was_fallback);
        assert!(!comparison.has_baseline());
        let view = engine.get_root_cause(week(3));
        assert!(view.report.is_none());
        assert!(view.snapshot_was_fallback);
        assert_eq!(view.snapshot_week, week(23));
    }

    #[test]
    fn test_insight_uses_ranker() {
        let engine = seed_engine().with_ranker(Box::new(ReverseRanker));
        let view = engine.get_insight(week(23));

        let mut expected = view.record.recommendations.clone();
        expected.reverse();
        assert_eq!(view.ranked_recommendations, expected);
        assert_eq!(engine.ranker_name(), "reverse");
    }

    #[test]
    fn test_insight_default_ranker_preserves_order() {
        let engine = seed_engine();
        let view = engine.get_insight(week(23));
        assert!(!view.was_fallback);
        assert_eq!(view.ranked_recommendations, view.record.recommendations);
    }

    #[test]
    fn test_insight_fallback_independent_of_snapshots() {
        let dataset = seed_dataset().unwrap();
        let insights: Vec<InsightRecord> = dataset
            .insights
            .into_iter()
            .filter(|i| i.week.get() <= 21)
            .collect();
        let engine = KpiEngine::new(
            WeekRepository::new("snapshot", dataset.snapshots).unwrap(),
            WeekRepository::new("insight", insights).unwrap(),
            EngineConfig::default(),
        );

        let comparison = engine.get_comparison(week(23));
        let view = engine.get_insight(week(23));
        assert!(!comparison.snapshot_was_fallback);
        assert!(view.was_fallback);
        assert_eq!(view.record.week, week(21));
    }

    #[test]
    fn test_root_cause_and_trend() {
        let engine = seed_engine();
        let view = engine.get_root_cause(week(23));
        assert!(!view.is_degraded());
        assert_eq!(view.report.unwrap().previous_week, week(22));
        assert!(engine.get_root_cause(week(20)).report.is_none());

        let trend = engine.trend();
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[2].current_week, week(23));
    }

    #[test]
    fn test_root_cause_reports_fallback_snapshot() {
        let engine = seed_engine();
        let view = engine.get_root_cause(week(30));

        assert_eq!(view.requested_week, week(30));
        assert_eq!(view.snapshot_week, week(23));
        assert!(view.snapshot_was_fallback);
        assert_eq!(view.previous_week, Some(week(22)));
        assert!(!view.previous_was_fallback);
        assert!(view.is_degraded());
        assert_eq!(view.report.unwrap().current_week, week(23));
    }

    #[test]
    fn test_metric_tree_for_week() {
        let engine = seed_engine();
        let tree = engine.get_metric_tree(week(22));
        assert_eq!(tree.week, week(22));
        assert!(!tree.was_fallback);
        assert_eq!(tree.report.root.value, 94.8);

        let fallback = engine.get_metric_tree(week(99));
        assert!(fallback.was_fallback);
        assert_eq!(fallback.report.week, week(23));
    }

    #[test]
    fn test_simulation_uses_configured_model() {
        let config = EngineConfig {
            simulation: LoadModel::new(0.0, 0.0).unwrap(),
            ..EngineConfig::default()
        };
        let engine = KpiEngine::from_dataset(seed_dataset().unwrap(), config).unwrap();

        let report = engine.simulate_load(week(23), &[50.0]).unwrap().report;
        assert_eq!(report.scenarios[0].dispatch_score, 78.9);

        let stress = seed_engine().stress_test(week(23), 25.0, 100.0).unwrap();
        assert_eq!(stress.report.scenarios.len(), 4);
        assert!(seed_engine().stress_test(week(23), -5.0, 100.0).is_err());
    }
}
