//! Domain models for weekly KPI snapshots and narrative insights

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Identifier of one operational reporting week (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WeekId(u32);

impl WeekId {
    /// Create a week id, rejecting zero
    pub fn new(value: u32) -> crate::Result<Self> {
        if value == 0 {
            return Err(Error::InvalidData(
                "week id must be a positive integer".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The week immediately before this one, if any
    pub fn previous(self) -> Option<WeekId> {
        (self.0 > 1).then(|| WeekId(self.0 - 1))
    }
}

impl TryFrom<u32> for WeekId {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        WeekId::new(value)
    }
}

impl From<WeekId> for u32 {
    fn from(week: WeekId) -> Self {
        week.0
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

impl FromStr for WeekId {
    type Err = String;

    /// Accepts "21" or "W21" / "w21"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['W', 'w']);
        let value: u32 = digits
            .parse()
            .map_err(|_| format!("Invalid week id: {}", s))?;
        WeekId::new(value).map_err(|e| e.to_string())
    }
}

/// The five tracked KPIs, declared in canonical comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Delivery,
    Accuracy,
    Dispatch,
    Warehouse,
    OnTime,
}

impl Metric {
    /// All metrics in canonical order: delivery, accuracy, dispatch, warehouse, on-time
    pub const ALL: [Metric; 5] = [
        Metric::Delivery,
        Metric::Accuracy,
        Metric::Dispatch,
        Metric::Warehouse,
        Metric::OnTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Delivery => "delivery",
            Metric::Accuracy => "accuracy",
            Metric::Dispatch => "dispatch",
            Metric::Warehouse => "warehouse",
            Metric::OnTime => "on_time",
        }
    }

    /// Column name in snapshot CSV exports
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Delivery => "delivery_score",
            Metric::Accuracy => "accuracy_score",
            Metric::Dispatch => "dispatch_score",
            Metric::Warehouse => "warehouse_score",
            Metric::OnTime => "on_time_score",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Delivery => "Delivery Performance",
            Metric::Accuracy => "Order Accuracy",
            Metric::Dispatch => "Dispatch Score",
            Metric::Warehouse => "Warehouse Utilization",
            Metric::OnTime => "On-Time Delivery",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" | "delivery_score" => Ok(Metric::Delivery),
            "accuracy" | "accuracy_score" => Ok(Metric::Accuracy),
            "dispatch" | "dispatch_score" => Ok(Metric::Dispatch),
            "warehouse" | "warehouse_score" => Ok(Metric::Warehouse),
            "on_time" | "on_time_score" => Ok(Metric::OnTime),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// Immutable KPI values for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub week: WeekId,
    pub delivery_score: f64,
    pub accuracy_score: f64,
    pub dispatch_score: f64,
    pub warehouse_score: f64,
    pub on_time_score: f64,
}

impl KpiSnapshot {
    pub fn new(week: WeekId, values: [f64; 5]) -> Self {
        let [delivery_score, accuracy_score, dispatch_score, warehouse_score, on_time_score] =
            values;
        Self {
            week,
            delivery_score,
            accuracy_score,
            dispatch_score,
            warehouse_score,
            on_time_score,
        }
    }

    /// Create a snapshot, rejecting NaN and infinite metric values
    pub fn try_new(week: WeekId, values: [f64; 5]) -> crate::Result<Self> {
        let snapshot = Self::new(week, values);
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Every metric must be a finite number
    pub fn validate(&self) -> crate::Result<()> {
        match Metric::ALL.iter().find(|&&m| !self.value(m).is_finite()) {
            Some(metric) => Err(Error::InvalidData(format!(
                "{} snapshot has non-finite {}: {}",
                self.week,
                metric.column(),
                self.value(*metric)
            ))),
            None => Ok(()),
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Delivery => self.delivery_score,
            Metric::Accuracy => self.accuracy_score,
            Metric::Dispatch => self.dispatch_score,
            Metric::Warehouse => self.warehouse_score,
            Metric::OnTime => self.on_time_score,
        }
    }
}

/// Direction of a week-over-week change (zero counts as Up)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_delta(delta: f64) -> Self {
        if delta >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
        }
    }
}

/// Change of one metric between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub metric: Metric,
    pub current: f64,
    pub previous: f64,
    /// `current - previous`, rounded to one decimal place
    pub delta: f64,
    pub direction: Direction,
}

/// Alert verdict for a metric or a whole week
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Normal,
    Alert,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Normal => "normal",
            AlertStatus::Alert => "alert",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, AlertStatus::Alert)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(AlertStatus::Normal),
            "alert" => Ok(AlertStatus::Alert),
            _ => Err(format!("Unknown alert status: {}", s)),
        }
    }
}

/// Narrative insight for one week, sourced independently of the KPI snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub week: WeekId,
    pub status: AlertStatus,
    pub summary: String,
    pub bottleneck: String,
    pub root_cause: String,
    /// Pre-ranked by the narrative source, most urgent first
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Benchmark band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Average,
    Poor,
}

/// Lower bounds for excellent, good and average benchmark ratings
pub const BENCHMARK_BANDS: [f64; 3] = [80.0, 65.0, 50.0];

impl Rating {
    pub fn for_value(value: f64) -> Self {
        Self::with_bands(value, BENCHMARK_BANDS)
    }

    /// Rate against `[excellent, good, average]` lower bounds, highest first
    pub fn with_bands(value: f64, bands: [f64; 3]) -> Self {
        let [excellent, good, average] = bands;
        if value >= excellent {
            Rating::Excellent
        } else if value >= good {
            Rating::Good
        } else if value >= average {
            Rating::Average
        } else {
            Rating::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Average => "average",
            Rating::Poor => "poor",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Round half away from zero to `places` decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
