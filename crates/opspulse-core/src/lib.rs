//! opspulse Core Library
//!
//! Weekly supply-chain KPI comparison and alert classification:
//! - Week-keyed snapshot and insight repositories with fallback-to-latest resolution
//! - Per-metric week-over-week deltas
//! - Fixed-threshold alert classification (per metric and aggregate)
//! - Root-cause breakdown of delivery score changes
//! - Metric tree with absolute-level alerts and what-if load simulation
//! - Recommendation ranking seam
//! - Cancellable insight regeneration state machine
//! - CSV / TOML / JSON data sources and TOML engine configuration

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod insights;
pub mod models;
pub mod repository;
pub mod selection;
pub mod source;

pub use analysis::{
    compare, level_alerts, metric_tree, multi_week_root_cause, root_cause, AlertClassifier,
    AlertLevel, Classification, ImpactFactor, LevelAlert, LoadModel, LoadSimulationReport,
    MetricNode, MetricTree, RiskLevel, RootCauseReport, ScenarioResult, ALERT_DELTA_THRESHOLD,
};
pub use config::{load_config, EngineConfig};
pub use engine::{Comparison, InsightView, KpiEngine, RootCauseView, WeekReport};
pub use error::{Error, Result};
pub use insights::{
    InsertionOrderRanker, InsightRegenerationController, RecommendationRanker,
    RegenerationConfig, RegenerationState,
};
pub use models::{
    AlertStatus, Direction, InsightRecord, KpiSnapshot, Metric, MetricDelta, Rating, WeekId,
};
pub use repository::{InsightRepository, Resolved, SnapshotRepository, WeekKeyed, WeekRepository};
pub use selection::{SelectionTicket, WeekSelector};
pub use source::{seed_dataset, Dataset};
