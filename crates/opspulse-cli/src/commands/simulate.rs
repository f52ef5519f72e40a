//! What-if load simulation command

use anyhow::{Context, Result};
use opspulse_core::{KpiEngine, LoadSimulationReport, WeekReport};

use super::core::{print_json, resolve_week, OutputFormat};
use super::reports::fallback_note;

/// Which scenarios to run
#[derive(Debug, Clone, PartialEq)]
pub enum LoadPlan {
    /// Explicit order increases, in percent
    Increases(Vec<f64>),
    /// Step up to a maximum, in percent
    Stress { step: f64, max: f64 },
}

impl LoadPlan {
    pub fn from_args(increases: Vec<f64>, step: f64, max: f64) -> Self {
        if increases.is_empty() {
            LoadPlan::Stress { step, max }
        } else {
            LoadPlan::Increases(increases)
        }
    }
}

pub fn cmd_simulate(
    engine: &KpiEngine,
    week: Option<&str>,
    plan: &LoadPlan,
    format: OutputFormat,
) -> Result<()> {
    let week = resolve_week(engine, week)?;
    let simulation = match plan {
        LoadPlan::Increases(increases) => engine.simulate_load(week, increases),
        LoadPlan::Stress { step, max } => engine.stress_test(week, *step, *max),
    }
    .context("Load simulation failed")?;

    match format {
        OutputFormat::Json => print_json(&simulation),
        OutputFormat::Text => {
            println!("{}", render_simulation(&simulation));
            Ok(())
        }
    }
}

pub fn render_simulation(simulation: &WeekReport<LoadSimulationReport>) -> String {
    let mut lines = Vec::new();
    if simulation.was_fallback {
        lines.push(fallback_note(simulation.requested_week, simulation.week));
    }
    lines.push(simulation.report.summary());
    lines.join("\n")
}
