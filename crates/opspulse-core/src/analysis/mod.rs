//! Week-over-week analysis
//!
//! - **Delta** - per-metric change between two snapshots, canonical order
//! - **Classifier** - fixed-threshold Alert/Normal verdicts per metric and aggregate
//! - **Root cause** - weighted breakdown of a delivery score change
//! - **Tree** - delivery score decomposition with absolute-level alerts
//! - **Simulation** - what-if order load scenarios and stress tests
//!
//! Everything here is a pure function of its inputs. Classification depends
//! on the (current, previous) pair, not on a week alone, so results are
//! recomputed for every comparison rather than cached by week.

pub mod classifier;
pub mod delta;
pub mod root_cause;
pub mod simulation;
pub mod tree;

pub use classifier::{AlertClassifier, Classification, ALERT_DELTA_THRESHOLD};
pub use delta::compare;
pub use root_cause::{
    multi_week_root_cause, root_cause, DriverDirection, ImpactFactor, RootCauseReport,
    DRIVER_WEIGHTS,
};
pub use simulation::{
    LoadModel, LoadSimulationReport, RiskLevel, ScenarioResult, BREAKING_POINT_SCORE,
};
pub use tree::{level_alerts, metric_tree, AlertLevel, LevelAlert, MetricNode, MetricTree};
