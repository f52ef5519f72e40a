//! Root-cause breakdown of a delivery score change
//!
//! Explains a week-over-week delivery change through its weighted
//! contributors: warehouse (0.4), accuracy (0.3) and dispatch (0.3).

use serde::Serialize;

use crate::models::{round_to, KpiSnapshot, Metric, WeekId};

/// Contributor metrics and their weight in the delivery score
pub const DRIVER_WEIGHTS: [(Metric, f64); 3] = [
    (Metric::Warehouse, 0.4),
    (Metric::Accuracy, 0.3),
    (Metric::Dispatch, 0.3),
];

/// On-time score below which the verdict flags compounding lateness
const LOW_ON_TIME_SCORE: f64 = 20.0;

/// Widest impact bar in the text summary
const MAX_BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverDirection {
    Improving,
    Degrading,
    Stable,
}

impl DriverDirection {
    fn from_change(change: f64) -> Self {
        if change > 0.0 {
            DriverDirection::Improving
        } else if change < 0.0 {
            DriverDirection::Degrading
        } else {
            DriverDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverDirection::Improving => "improving",
            DriverDirection::Degrading => "degrading",
            DriverDirection::Stable => "stable",
        }
    }
}

/// One contributor's share of the change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactFactor {
    pub metric: Metric,
    pub previous: f64,
    pub current: f64,
    pub change: f64,
    pub weight: f64,
    pub weighted_impact: f64,
    pub direction: DriverDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootCauseReport {
    pub current_week: WeekId,
    pub previous_week: WeekId,
    pub previous_score: f64,
    pub current_score: f64,
    /// `previous - current` delivery score; positive means a decline
    pub total_drop: f64,
    pub main_driver: Metric,
    /// Most negative weighted impact first
    pub drivers: Vec<ImpactFactor>,
    pub verdict: String,
}

impl RootCauseReport {
    pub fn summary(&self) -> String {
        let sign = if self.total_drop < 0.0 { "+" } else { "-" };
        let mut lines = vec![
            format!("Root Cause Report: {}", Metric::Delivery.label()),
            format!("  {} -> {}", self.previous_week, self.current_week),
            format!(
                "  Score: {} -> {}  ({}{:.2})",
                self.previous_score,
                self.current_score,
                sign,
                self.total_drop.abs()
            ),
            format!("  Main Driver: {}", self.main_driver.label()),
            String::new(),
            "  Impact Breakdown:".to_string(),
        ];
        for d in &self.drivers {
            let bar = impact_bar(d.weighted_impact);
            lines.push(format!(
                "    {:<22}  change={:+.2}  impact={:+.2}  {:<10}  |{}",
                d.metric.label(),
                d.change,
                d.weighted_impact,
                d.direction.as_str(),
                bar
            ));
        }
        lines.push(String::new());
        lines.push(format!("  Verdict: {}", self.verdict));
        lines.join("\n")
    }
}

/// One `#` per two points of impact, capped; non-finite impacts draw nothing
fn impact_bar(impact: f64) -> String {
    let width = if impact.is_finite() {
        ((impact.abs() / 2.0) as usize).min(MAX_BAR_WIDTH)
    } else {
        0
    };
    "#".repeat(width)
}

/// Break down the delivery change from `previous` to `current`
pub fn root_cause(current: &KpiSnapshot, previous: &KpiSnapshot) -> RootCauseReport {
    let mut drivers: Vec<ImpactFactor> = DRIVER_WEIGHTS
        .iter()
        .map(|&(metric, weight)| {
            let current_value = current.value(metric);
            let previous_value = previous.value(metric);
            let change = current_value - previous_value;
            ImpactFactor {
                metric,
                previous: previous_value,
                current: current_value,
                change: round_to(change, 2),
                weight,
                weighted_impact: round_to(weight * change, 2),
                direction: DriverDirection::from_change(change),
            }
        })
        .collect();

    // Stable sort keeps declaration order among equal impacts
    drivers.sort_by(|a, b| a.weighted_impact.total_cmp(&b.weighted_impact));

    let total_drop = round_to(previous.delivery_score - current.delivery_score, 2);
    let main_driver = drivers[0].metric;
    let verdict = verdict(total_drop, &drivers[0], current.on_time_score);

    RootCauseReport {
        current_week: current.week,
        previous_week: previous.week,
        previous_score: previous.delivery_score,
        current_score: current.delivery_score,
        total_drop,
        main_driver,
        drivers,
        verdict,
    }
}

/// Reports for each consecutive pair of snapshots, which must be week-ascending
pub fn multi_week_root_cause(snapshots: &[&KpiSnapshot]) -> Vec<RootCauseReport> {
    snapshots
        .windows(2)
        .map(|pair| root_cause(pair[1], pair[0]))
        .collect()
}

fn verdict(drop: f64, worst: &ImpactFactor, on_time_score: f64) -> String {
    if drop <= 0.0 {
        return "Performance improved week-over-week. No corrective action required.".to_string();
    }

    let severity = if drop > 15.0 {
        "critically"
    } else if drop > 8.0 {
        "significantly"
    } else {
        "moderately"
    };
    let label = worst.metric.label();
    let on_time_note = if on_time_score < LOW_ON_TIME_SCORE {
        format!(
            " Low on-time score ({:.1}) may be compounding the issue.",
            on_time_score
        )
    } else {
        String::new()
    };

    format!(
        "Delivery score dropped {} by {:.2} points. {} was the primary driver (impact: {:+.2}).{} Investigate {} operations first.",
        severity,
        drop,
        label,
        worst.weighted_impact,
        on_time_note,
        label.to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(week: u32, values: [f64; 5]) -> KpiSnapshot {
        KpiSnapshot::new(WeekId::new(week).unwrap(), values)
    }

    #[test]
    fn test_root_cause_week_23() {
        let current = snapshot(23, [91.4, 97.4, 78.9, 74.9, 88.2]);
        let previous = snapshot(22, [94.8, 98.5, 82.1, 71.2, 91.7]);

        let report = root_cause(&current, &previous);
        assert_eq!(report.total_drop, 3.4);
        assert_eq!(report.main_driver, Metric::Dispatch);
        assert_eq!(report.drivers[0].weighted_impact, -0.96);
        assert_eq!(report.drivers[0].direction, DriverDirection::Degrading);
        // Warehouse improved, so it ranks last
        assert_eq!(report.drivers[2].metric, Metric::Warehouse);
        assert_eq!(report.drivers[2].weighted_impact, 1.48);
        assert!(report.verdict.starts_with("Delivery score dropped moderately by 3.40"));
        assert!(report.verdict.contains("Dispatch Score was the primary driver"));
    }

    #[test]
    fn test_root_cause_improvement_verdict() {
        let current = snapshot(21, [96.1, 99.1, 87.3, 69.8, 94.2]);
        let previous = snapshot(20, [94.2, 98.5, 85.0, 68.4, 92.6]);

        let report = root_cause(&current, &previous);
        assert!(report.total_drop < 0.0);
        assert!(report.verdict.starts_with("Performance improved"));
    }

    #[test]
    fn test_severity_bands_and_on_time_note() {
        let previous = snapshot(1, [90.0, 90.0, 90.0, 90.0, 90.0]);
        let current = snapshot(2, [70.0, 80.0, 60.0, 85.0, 15.0]);

        let report = root_cause(&current, &previous);
        assert_eq!(report.total_drop, 20.0);
        assert!(report.verdict.contains("critically"));
        assert!(report.verdict.contains("Low on-time score (15.0)"));
    }

    #[test]
    fn test_multi_week_pairs() {
        let a = snapshot(20, [94.2, 98.5, 85.0, 68.4, 92.6]);
        let b = snapshot(21, [96.1, 99.1, 87.3, 69.8, 94.2]);
        let c = snapshot(22, [94.8, 98.5, 82.1, 71.2, 91.7]);

        let reports = multi_week_root_cause(&[&a, &b, &c]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].previous_week, a.week);
        assert_eq!(reports[0].current_week, b.week);
        assert_eq!(reports[1].current_week, c.week);
        assert!(multi_week_root_cause(&[&a]).is_empty());
    }

    #[test]
    fn test_impact_bar_is_capped() {
        assert_eq!(impact_bar(-0.96), "");
        assert_eq!(impact_bar(-6.0), "###");
        assert_eq!(impact_bar(1e20).len(), MAX_BAR_WIDTH);
        assert_eq!(impact_bar(f64::INFINITY), "");
        assert_eq!(impact_bar(f64::NAN), "");
    }

    #[test]
    fn test_summary_with_huge_change_renders() {
        let previous = snapshot(1, [90.0, 90.0, 90.0, 0.0, 90.0]);
        let current = snapshot(2, [90.0, 90.0, 90.0, 1e20, 90.0]);
        let summary = root_cause(&current, &previous).summary();
        assert!(summary.contains(&format!("|{}", "#".repeat(MAX_BAR_WIDTH))));
    }

    #[test]
    fn test_summary_lists_every_driver() {
        let current = snapshot(23, [91.4, 97.4, 78.9, 74.9, 88.2]);
        let previous = snapshot(22, [94.8, 98.5, 82.1, 71.2, 91.7]);
        let summary = root_cause(&current, &previous).summary();
        assert!(summary.contains("W22 -> W23"));
        assert!(summary.contains("Warehouse Utilization"));
        assert!(summary.contains("Verdict:"));
    }
}
