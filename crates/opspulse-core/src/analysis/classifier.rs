//! Fixed-threshold alert classification
//!
//! A metric is `Alert` when its delta is strictly below the threshold
//! (default -2.0). The week is `Alert` when any single metric is, so one
//! severe regression flips the whole period regardless of how many metrics
//! improved.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{AlertStatus, Metric, MetricDelta};

/// Delta below which a metric is classified as `Alert`
pub const ALERT_DELTA_THRESHOLD: f64 = -2.0;

/// Per-metric and aggregate verdicts for one comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub per_metric: BTreeMap<Metric, AlertStatus>,
    pub aggregate: AlertStatus,
    /// False when there was no previous snapshot to compare against
    pub has_baseline: bool,
}

impl Classification {
    /// Outcome when no baseline exists: every metric and the aggregate are `Normal`
    pub fn no_baseline() -> Self {
        Self {
            per_metric: Metric::ALL
                .iter()
                .map(|&m| (m, AlertStatus::Normal))
                .collect(),
            aggregate: AlertStatus::Normal,
            has_baseline: false,
        }
    }

    pub fn status(&self, metric: Metric) -> AlertStatus {
        self.per_metric.get(&metric).copied().unwrap_or_default()
    }

    /// Metrics currently in alert, canonical order
    pub fn alerting(&self) -> Vec<Metric> {
        self.per_metric
            .iter()
            .filter(|(_, status)| status.is_alert())
            .map(|(metric, _)| *metric)
            .collect()
    }
}

/// Stateless classifier over a set of deltas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertClassifier {
    threshold: f64,
}

impl Default for AlertClassifier {
    fn default() -> Self {
        Self {
            threshold: ALERT_DELTA_THRESHOLD,
        }
    }
}

impl AlertClassifier {
    /// Create a classifier with a custom threshold.
    ///
    /// The threshold must be finite and not positive.
    pub fn with_threshold(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold > 0.0 {
            return Err(Error::Configuration(format!(
                "alert threshold must be a finite value <= 0, got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify_metric(&self, delta: &MetricDelta) -> AlertStatus {
        if delta.delta < self.threshold {
            AlertStatus::Alert
        } else {
            AlertStatus::Normal
        }
    }

    /// Classify a comparison's deltas
    pub fn classify(&self, deltas: &[MetricDelta]) -> Classification {
        let per_metric: BTreeMap<Metric, AlertStatus> = deltas
            .iter()
            .map(|d| (d.metric, self.classify_metric(d)))
            .collect();

        let aggregate = if per_metric.values().any(AlertStatus::is_alert) {
            AlertStatus::Alert
        } else {
            AlertStatus::Normal
        };

        if aggregate.is_alert() {
            tracing::debug!(
                alerts = per_metric.values().filter(|s| s.is_alert()).count(),
                threshold = self.threshold,
                "Comparison classified as alert"
            );
        }

        Classification {
            per_metric,
            aggregate,
            has_baseline: true,
        }
    }
}
