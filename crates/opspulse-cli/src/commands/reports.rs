//! Report command implementations

use anyhow::Result;
use opspulse_core::{
    AlertStatus, Comparison, InsightView, KpiEngine, MetricNode, MetricTree, RootCauseReport,
    RootCauseView, WeekId, WeekReport,
};
use serde::Serialize;

use super::core::{print_json, resolve_week, OutputFormat};

#[derive(Serialize)]
struct WeeksOutput {
    snapshot_weeks: Vec<u32>,
    insight_weeks: Vec<u32>,
    latest: u32,
}

pub fn cmd_weeks(engine: &KpiEngine, format: OutputFormat) -> Result<()> {
    let output = WeeksOutput {
        snapshot_weeks: engine.weeks().into_iter().map(u32::from).collect(),
        insight_weeks: engine
            .insights()
            .weeks()
            .into_iter()
            .map(u32::from)
            .collect(),
        latest: engine.snapshots().latest().get(),
    };

    if format == OutputFormat::Json {
        return print_json(&output);
    }

    let join = |weeks: &[u32]| {
        weeks
            .iter()
            .map(|w| format!("W{}", w))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Snapshot weeks: {}", join(&output.snapshot_weeks));
    println!("Insight weeks:  {}", join(&output.insight_weeks));
    println!("Latest:         W{}", output.latest);
    Ok(())
}

pub fn cmd_compare(engine: &KpiEngine, week: Option<&str>, format: OutputFormat) -> Result<()> {
    let week = resolve_week(engine, week)?;
    let comparison = engine.get_comparison(week);

    match format {
        OutputFormat::Json => print_json(&comparison),
        OutputFormat::Text => {
            println!("{}", render_comparison(&comparison, engine.classifier().threshold()));
            Ok(())
        }
    }
}

pub fn cmd_insight(engine: &KpiEngine, week: Option<&str>, format: OutputFormat) -> Result<()> {
    let week = resolve_week(engine, week)?;
    let view = engine.get_insight(week);

    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Text => {
            println!("{}", render_insight(&view));
            Ok(())
        }
    }
}

pub fn cmd_root_cause(engine: &KpiEngine, week: Option<&str>, format: OutputFormat) -> Result<()> {
    let week = resolve_week(engine, week)?;
    let view = engine.get_root_cause(week);

    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Text => {
            println!("{}", render_root_cause(&view));
            Ok(())
        }
    }
}

pub fn cmd_trend(engine: &KpiEngine, format: OutputFormat) -> Result<()> {
    let reports = engine.trend();

    if format == OutputFormat::Json {
        return print_json(&reports);
    }

    if reports.is_empty() {
        println!("Need at least 2 weeks of data.");
        return Ok(());
    }

    println!("Multi-Week Delivery Trend");
    println!("{}", "=".repeat(55));
    for line in reports.iter().map(render_trend_line) {
        println!("{}", line);
    }
    Ok(())
}

pub fn cmd_tree(engine: &KpiEngine, week: Option<&str>, format: OutputFormat) -> Result<()> {
    let week = resolve_week(engine, week)?;
    let tree = engine.get_metric_tree(week);

    match format {
        OutputFormat::Json => print_json(&tree),
        OutputFormat::Text => {
            println!("{}", render_metric_tree(&tree));
            Ok(())
        }
    }
}

/// Text rendering of a comparison, including degraded-data disclosures
pub fn render_comparison(comparison: &Comparison, threshold: f64) -> String {
    let mut lines = Vec::new();

    let baseline = comparison
        .previous_snapshot
        .as_ref()
        .map(|p| p.week.to_string())
        .unwrap_or_else(|| "none".to_string());
    lines.push(format!(
        "KPI comparison for {} (baseline {})",
        comparison.snapshot.week, baseline
    ));

    lines.extend(disclosures(comparison));

    if comparison.has_baseline() {
        lines.push(format!(
            "  {:<22} {:>8} {:>9} {:>8}  {:<7} {}",
            "Metric", "Current", "Previous", "Delta", "Status", "Rating"
        ));
        for delta in &comparison.deltas {
            let rating = comparison
                .ratings
                .iter()
                .find(|(m, _)| *m == delta.metric)
                .map(|(_, r)| r.as_str())
                .unwrap_or("-");
            lines.push(format!(
                "  {:<22} {:>8.1} {:>9.1} {} {:>+6.1}  {:<7} {}",
                delta.metric.label(),
                delta.current,
                delta.previous,
                delta.direction.arrow(),
                delta.delta,
                status_label(comparison.status(delta.metric)),
                rating
            ));
        }
    } else {
        for (metric, rating) in &comparison.ratings {
            lines.push(format!(
                "  {:<22} {:>8.1}  {}",
                metric.label(),
                comparison.snapshot.value(*metric),
                rating
            ));
        }
    }

    let alerting = comparison.classification.alerting();
    let overall = if alerting.is_empty() {
        status_label(comparison.aggregate_status()).to_string()
    } else {
        format!(
            "{} ({} metric(s) below {:+.1})",
            status_label(comparison.aggregate_status()),
            alerting.len(),
            threshold
        )
    };
    lines.push(format!("  Overall: {}", overall));

    lines.join("\n")
}

pub fn render_insight(view: &InsightView) -> String {
    let mut lines = vec![format!(
        "Insight for {} [{}]",
        view.record.week,
        status_label(view.record.status)
    )];
    if view.was_fallback {
        lines.push(format!(
            "  ! No insight for {}; showing latest available ({})",
            view.requested_week, view.record.week
        ));
    }
    lines.push(format!("  Summary:    {}", view.record.summary));
    lines.push(format!("  Bottleneck: {}", view.record.bottleneck));
    lines.push(format!("  Root cause: {}", view.record.root_cause));
    if !view.ranked_recommendations.is_empty() {
        lines.push("  Recommendations:".to_string());
        for (i, rec) in view.ranked_recommendations.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, rec));
        }
    }
    lines.join("\n")
}

pub fn render_root_cause(view: &RootCauseView) -> String {
    let mut lines = Vec::new();
    if view.snapshot_was_fallback {
        lines.push(fallback_note(view.requested_week, view.snapshot_week));
    }
    lines.extend(baseline_note(view.previous_week, view.previous_was_fallback));

    match &view.report {
        Some(report) => lines.push(report.summary()),
        None => lines.push(format!(
            "No baseline week available before {}.",
            view.snapshot_week.min(view.requested_week)
        )),
    }
    lines.join("\n")
}

pub fn render_metric_tree(tree: &WeekReport<MetricTree>) -> String {
    let mut lines = vec![format!("Metric tree for {}", tree.week)];
    if tree.was_fallback {
        lines.push(fallback_note(tree.requested_week, tree.week));
    }

    lines.push(render_node(&tree.report.root, 1));
    for child in &tree.report.root.children {
        lines.push(render_node(child, 2));
    }

    if tree.report.alerts.is_empty() {
        lines.push("  Level alerts: none".to_string());
    } else {
        lines.push(format!(
            "  Level alerts: {} critical, {} warning",
            tree.report.critical_count(),
            tree.report.warning_count()
        ));
        for alert in &tree.report.alerts {
            lines.push(format!("    - {}", alert.message));
        }
    }
    lines.join("\n")
}

fn render_node(node: &MetricNode, depth: usize) -> String {
    let weight = node
        .weight
        .map(|w| format!(" x{:.1}", w))
        .unwrap_or_default();
    let flags = if node.alerts.is_empty() {
        String::new()
    } else {
        let levels: Vec<&str> = node.alerts.iter().map(|a| a.as_str()).collect();
        format!("  [{}]", levels.join(", "))
    };
    format!(
        "{}{:<24} {:>6.1}{:<5}  {}{}",
        "  ".repeat(depth),
        node.name,
        node.value,
        weight,
        node.status,
        flags
    )
}

fn render_trend_line(report: &RootCauseReport) -> String {
    let arrow = if report.total_drop > 0.0 { "v" } else { "^" };
    format!(
        "  {} -> {}  {} {:.2}  driver: {}",
        report.previous_week,
        report.current_week,
        arrow,
        report.total_drop.abs(),
        report.main_driver.label()
    )
}

fn disclosures(comparison: &Comparison) -> Vec<String> {
    let mut notes = Vec::new();
    if comparison.snapshot_was_fallback {
        notes.push(fallback_note(comparison.requested_week, comparison.snapshot.week));
    }
    notes.extend(baseline_note(
        comparison.previous_snapshot.as_ref().map(|p| p.week),
        comparison.previous_was_fallback,
    ));
    if !comparison.has_baseline() {
        notes.push("  ! No baseline week available; status defaults to NORMAL".to_string());
    }
    notes
}

pub(super) fn fallback_note(requested: WeekId, resolved: WeekId) -> String {
    format!(
        "  ! No snapshot for {}; showing latest available week {}",
        requested, resolved
    )
}

fn baseline_note(previous: Option<WeekId>, was_fallback: bool) -> Option<String> {
    previous
        .filter(|_| was_fallback)
        .map(|week| format!("  ! Baseline {} is not the adjacent week", week))
}

fn status_label(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Normal => "NORMAL",
        AlertStatus::Alert => "ALERT",
    }
}
