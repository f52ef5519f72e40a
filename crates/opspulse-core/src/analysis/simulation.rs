//! What-if order load simulation
//!
//! Scales a week's warehouse and dispatch scores down under extra order
//! volume, `score / (1 + pct/100) ^ elasticity`, and recombines the
//! delivery score from the weighted contributors. Accuracy is treated as
//! load-independent.

use std::fmt;

use serde::Serialize;

use super::root_cause::DRIVER_WEIGHTS;
use crate::error::{Error, Result};
use crate::models::{round_to, KpiSnapshot, Metric, WeekId};

/// Simulated delivery score below which the network is considered broken
pub const BREAKING_POINT_SCORE: f64 = 40.0;

/// Most scenarios a single stress test may generate
pub const MAX_SCENARIOS: usize = 1000;

pub const DEFAULT_WAREHOUSE_ELASTICITY: f64 = 1.0;
pub const DEFAULT_DISPATCH_ELASTICITY: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn for_score(delivery_score: f64) -> Self {
        if delivery_score >= 70.0 {
            RiskLevel::Low
        } else if delivery_score >= 55.0 {
            RiskLevel::Moderate
        } else if delivery_score >= BREAKING_POINT_SCORE {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one simulated load increase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub label: String,
    pub order_increase_pct: f64,
    pub warehouse_score: f64,
    pub accuracy_score: f64,
    pub dispatch_score: f64,
    pub delivery_score: f64,
    /// Simulated minus actual delivery score
    pub delivery_delta: f64,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSimulationReport {
    pub base_week: WeekId,
    pub baseline_delivery: f64,
    pub scenarios: Vec<ScenarioResult>,
    /// First simulated increase that pushes delivery below the breaking point
    pub breaking_point_pct: Option<f64>,
}

impl LoadSimulationReport {
    pub fn summary(&self) -> String {
        let breaking = match self.breaking_point_pct {
            Some(pct) => format!("{:+.1}% order increase", pct),
            None => "not reached".to_string(),
        };
        let mut lines = vec![
            format!("Load Simulation Report: {}", Metric::Delivery.label()),
            format!("  Base Week    : {}", self.base_week),
            format!("  Base Score   : {:.2}", self.baseline_delivery),
            format!(
                "  Breaking Point (score < {}): {}",
                BREAKING_POINT_SCORE, breaking
            ),
            String::new(),
            format!(
                "  {:<20}  {:>7}  {:>9}  {:>8}  Risk",
                "Scenario", "Load", "Delivery", "Delta"
            ),
            format!("  {}", "-".repeat(60)),
        ];
        for s in &self.scenarios {
            lines.push(format!(
                "  {:<20}  {:>+6.1}%  {:>9.2}  {:>+8.2}  {}",
                s.label, s.order_increase_pct, s.delivery_score, s.delivery_delta, s.risk
            ));
        }
        lines.join("\n")
    }
}

/// How strongly each load-sensitive score reacts to extra orders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadModel {
    warehouse_elasticity: f64,
    dispatch_elasticity: f64,
}

impl Default for LoadModel {
    fn default() -> Self {
        Self {
            warehouse_elasticity: DEFAULT_WAREHOUSE_ELASTICITY,
            dispatch_elasticity: DEFAULT_DISPATCH_ELASTICITY,
        }
    }
}

impl LoadModel {
    /// Elasticities must be finite and non-negative
    pub fn new(warehouse_elasticity: f64, dispatch_elasticity: f64) -> Result<Self> {
        for (name, value) in [
            ("warehouse_elasticity", warehouse_elasticity),
            ("dispatch_elasticity", dispatch_elasticity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Configuration(format!(
                    "{} must be a finite value >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            warehouse_elasticity,
            dispatch_elasticity,
        })
    }

    pub fn warehouse_elasticity(&self) -> f64 {
        self.warehouse_elasticity
    }

    pub fn dispatch_elasticity(&self) -> f64 {
        self.dispatch_elasticity
    }

    /// Simulate `order_increase_pct` more orders (negative means fewer)
    pub fn simulate(&self, snapshot: &KpiSnapshot, order_increase_pct: f64) -> Result<ScenarioResult> {
        if !order_increase_pct.is_finite() || order_increase_pct <= -100.0 {
            return Err(Error::InvalidData(format!(
                "order increase must be a finite percentage above -100, got {}",
                order_increase_pct
            )));
        }

        let factor = 1.0 + order_increase_pct / 100.0;
        let loaded = |metric: Metric, elasticity: f64| {
            round_to(snapshot.value(metric) / factor.powf(elasticity), 2)
        };
        let warehouse_score = loaded(Metric::Warehouse, self.warehouse_elasticity);
        let dispatch_score = loaded(Metric::Dispatch, self.dispatch_elasticity);
        let accuracy_score = snapshot.accuracy_score;

        let weighted: f64 = DRIVER_WEIGHTS
            .iter()
            .map(|&(metric, weight)| {
                let value = match metric {
                    Metric::Warehouse => warehouse_score,
                    Metric::Dispatch => dispatch_score,
                    other => snapshot.value(other),
                };
                weight * value
            })
            .sum();
        let delivery_score = round_to(weighted, 2);

        Ok(ScenarioResult {
            label: format!("{:+.0}% orders", order_increase_pct),
            order_increase_pct,
            warehouse_score,
            accuracy_score,
            dispatch_score,
            delivery_score,
            delivery_delta: round_to(delivery_score - snapshot.delivery_score, 2),
            risk: RiskLevel::for_score(delivery_score),
        })
    }

    /// Simulate each increase in order
    pub fn simulate_range(
        &self,
        snapshot: &KpiSnapshot,
        increments: &[f64],
    ) -> Result<LoadSimulationReport> {
        let scenarios = increments
            .iter()
            .map(|&pct| self.simulate(snapshot, pct))
            .collect::<Result<Vec<_>>>()?;
        let breaking_point_pct = scenarios
            .iter()
            .find(|s| s.delivery_score < BREAKING_POINT_SCORE)
            .map(|s| s.order_increase_pct);

        tracing::debug!(
            week = %snapshot.week,
            scenarios = scenarios.len(),
            breaking_point = ?breaking_point_pct,
            "Load simulation complete"
        );

        Ok(LoadSimulationReport {
            base_week: snapshot.week,
            baseline_delivery: snapshot.delivery_score,
            scenarios,
            breaking_point_pct,
        })
    }

    /// Increase load by `step` percent at a time, up to and including `max_increase`
    pub fn stress_test(
        &self,
        snapshot: &KpiSnapshot,
        step: f64,
        max_increase: f64,
    ) -> Result<LoadSimulationReport> {
        if !step.is_finite() || step <= 0.0 || !max_increase.is_finite() || max_increase < step {
            return Err(Error::InvalidData(format!(
                "stress test needs a positive step no larger than the maximum, got step {} max {}",
                step, max_increase
            )));
        }

        let count = (max_increase / step + 1e-9).floor() as usize;
        if count > MAX_SCENARIOS {
            return Err(Error::InvalidData(format!(
                "stress test would generate {} scenarios (limit {})",
                count, MAX_SCENARIOS
            )));
        }

        let increments: Vec<f64> = (1..=count).map(|i| round_to(step * i as f64, 1)).collect();
        self.simulate_range(snapshot, &increments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week_23() -> KpiSnapshot {
        KpiSnapshot::new(WeekId::new(23).unwrap(), [91.4, 97.4, 78.9, 74.9, 88.2])
    }

    fn strained() -> KpiSnapshot {
        KpiSnapshot::new(WeekId::new(9).unwrap(), [60.0, 50.0, 50.0, 50.0, 80.0])
    }

    #[test]
    fn test_simulate_scales_load_sensitive_scores() {
        let result = LoadModel::default().simulate(&week_23(), 20.0).unwrap();
        assert_eq!(result.label, "+20% orders");
        assert_eq!(result.warehouse_score, 62.42);
        assert_eq!(result.dispatch_score, 63.4);
        assert_eq!(result.accuracy_score, 97.4);
        assert_eq!(result.delivery_score, 73.21);
        assert_eq!(result.delivery_delta, -18.19);
        assert_eq!(result.risk, RiskLevel::Low);
    }

    #[test]
    fn test_risk_bands() {
        let model = LoadModel::default();
        assert_eq!(model.simulate(&week_23(), 50.0).unwrap().risk, RiskLevel::Moderate);
        assert_eq!(model.simulate(&week_23(), 100.0).unwrap().risk, RiskLevel::High);
        assert_eq!(RiskLevel::for_score(39.99), RiskLevel::Critical);
        assert_eq!(RiskLevel::for_score(70.0), RiskLevel::Low);
    }

    #[test]
    fn test_stress_test_finds_breaking_point() {
        let report = LoadModel::default().stress_test(&strained(), 10.0, 50.0).unwrap();
        let pcts: Vec<f64> = report.scenarios.iter().map(|s| s.order_increase_pct).collect();
        assert_eq!(pcts, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(report.scenarios[0].delivery_score, 46.56);
        assert_eq!(report.scenarios[3].delivery_score, 39.3);
        assert_eq!(report.breaking_point_pct, Some(40.0));
        assert!(report.summary().contains("Breaking Point (score < 40): +40.0% order increase"));
    }

    #[test]
    fn test_breaking_point_not_reached() {
        let report = LoadModel::default()
            .simulate_range(&week_23(), &[10.0, 20.0])
            .unwrap();
        assert_eq!(report.breaking_point_pct, None);
        assert_eq!(report.base_week.get(), 23);
        assert!(report.summary().contains("not reached"));
    }

    #[test]
    fn test_fewer_orders_raise_scores() {
        let result = LoadModel::default().simulate(&strained(), -20.0).unwrap();
        assert_eq!(result.label, "-20% orders");
        assert_eq!(result.warehouse_score, 62.5);
        assert!(result.dispatch_score > 50.0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let model = LoadModel::default();
        assert!(matches!(model.simulate(&week_23(), -100.0), Err(Error::InvalidData(_))));
        assert!(model.simulate(&week_23(), f64::NAN).is_err());
        assert!(model.stress_test(&week_23(), 0.0, 100.0).is_err());
        assert!(model.stress_test(&week_23(), 10.0, 5.0).is_err());
        assert!(model.stress_test(&week_23(), 0.001, 100.0).is_err());
        assert!(matches!(LoadModel::new(-1.0, 1.2), Err(Error::Configuration(_))));
        assert!(LoadModel::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_elasticity_ignores_load() {
        let model = LoadModel::new(0.0, 0.0).unwrap();
        let result = model.simulate(&week_23(), 80.0).unwrap();
        assert_eq!(result.warehouse_score, 74.9);
        assert_eq!(result.dispatch_score, 78.9);
    }
}
