//! Metric tree and absolute-level alerts
//!
//! The tree decomposes the delivery score into its weighted contributors
//! (see [`DRIVER_WEIGHTS`]). Each node carries a status band and any
//! level alerts raised for its metric. Level alerts look at a single
//! week's values, unlike the week-over-week classifier.

use std::fmt;

use serde::Serialize;

use super::root_cause::DRIVER_WEIGHTS;
use crate::models::{KpiSnapshot, Metric, Rating, WeekId};

/// Lower bounds for excellent, good and average tree nodes
pub const TREE_STATUS_BANDS: [f64; 3] = [75.0, 60.0, 40.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values at or below these bounds raise an alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThreshold {
    pub metric: Metric,
    pub warning: f64,
    pub critical: f64,
}

pub const LEVEL_THRESHOLDS: [LevelThreshold; 5] = [
    LevelThreshold {
        metric: Metric::Delivery,
        warning: 60.0,
        critical: 40.0,
    },
    LevelThreshold {
        metric: Metric::Warehouse,
        warning: 55.0,
        critical: 35.0,
    },
    LevelThreshold {
        metric: Metric::Accuracy,
        warning: 55.0,
        critical: 35.0,
    },
    LevelThreshold {
        metric: Metric::Dispatch,
        warning: 55.0,
        critical: 35.0,
    },
    // An on-time score of 70 is a 30% late-delivery rate
    LevelThreshold {
        metric: Metric::OnTime,
        warning: 70.0,
        critical: 50.0,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelAlert {
    pub metric: Metric,
    pub level: AlertLevel,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

/// Level alerts for one snapshot, in threshold table order
pub fn level_alerts(snapshot: &KpiSnapshot) -> Vec<LevelAlert> {
    LEVEL_THRESHOLDS
        .iter()
        .filter_map(|t| {
            let value = snapshot.value(t.metric);
            let (level, threshold) = if value <= t.critical {
                (AlertLevel::Critical, t.critical)
            } else if value <= t.warning {
                (AlertLevel::Warning, t.warning)
            } else {
                return None;
            };
            Some(LevelAlert {
                metric: t.metric,
                level,
                value,
                threshold,
                message: format!(
                    "{} is {}: {:.2} (below threshold of {})",
                    t.metric.label(),
                    level.as_str().to_uppercase(),
                    value,
                    threshold
                ),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricNode {
    pub metric: Metric,
    pub name: &'static str,
    pub value: f64,
    /// Share of the parent score; `None` for the root
    pub weight: Option<f64>,
    pub status: Rating,
    pub alerts: Vec<AlertLevel>,
    pub children: Vec<MetricNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTree {
    pub week: WeekId,
    pub root: MetricNode,
    pub alerts: Vec<LevelAlert>,
}

impl MetricTree {
    pub fn critical_count(&self) -> usize {
        self.count(AlertLevel::Critical)
    }

    pub fn warning_count(&self) -> usize {
        self.count(AlertLevel::Warning)
    }

    fn count(&self, level: AlertLevel) -> usize {
        self.alerts.iter().filter(|a| a.level == level).count()
    }
}

/// Delivery score tree for one snapshot
pub fn metric_tree(snapshot: &KpiSnapshot) -> MetricTree {
    let alerts = level_alerts(snapshot);
    let node = |metric: Metric, weight: Option<f64>, children: Vec<MetricNode>| {
        let value = snapshot.value(metric);
        MetricNode {
            metric,
            name: metric.label(),
            value,
            weight,
            status: Rating::with_bands(value, TREE_STATUS_BANDS),
            alerts: alerts
                .iter()
                .filter(|a| a.metric == metric)
                .map(|a| a.level)
                .collect(),
            children,
        }
    };

    let children = DRIVER_WEIGHTS
        .iter()
        .map(|&(metric, weight)| node(metric, Some(weight), Vec::new()))
        .collect();
    let root = node(Metric::Delivery, None, children);

    tracing::debug!(week = %snapshot.week, alerts = alerts.len(), "Metric tree built");
    MetricTree {
        week: snapshot.week,
        root,
        alerts,
    }
}
