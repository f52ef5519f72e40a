//! Shared command utilities

use std::path::Path;

use anyhow::{Context, Result};
use opspulse_core::source::{load_insights_path, load_snapshots_path};
use opspulse_core::{load_config, seed_dataset, EngineConfig, KpiEngine, WeekId};
use serde::Serialize;

/// Where the engine's config and data come from
#[derive(Debug, Clone, Copy, Default)]
pub struct Sources<'a> {
    pub config: Option<&'a Path>,
    pub snapshots: Option<&'a Path>,
    pub insights: Option<&'a Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub fn open_config(sources: &Sources) -> Result<EngineConfig> {
    load_config(sources.config).context("Failed to load engine config")
}

/// Build the engine from the configured sources, filling gaps with seed data
pub fn open_engine(sources: &Sources) -> Result<KpiEngine> {
    let config = open_config(sources)?;
    let mut dataset = seed_dataset().context("Failed to load built-in seed data")?;

    if let Some(path) = sources.snapshots {
        dataset.snapshots = load_snapshots_path(path)
            .with_context(|| format!("Failed to load snapshots from {}", path.display()))?;
    }
    if let Some(path) = sources.insights {
        dataset.insights = load_insights_path(path)
            .with_context(|| format!("Failed to load insights from {}", path.display()))?;
    }

    let engine = KpiEngine::from_dataset(dataset, config).context("Failed to initialize KPI engine")?;
    tracing::debug!(
        snapshots = engine.snapshots().len(),
        insights = engine.insights().len(),
        "Engine ready"
    );
    Ok(engine)
}

/// Parse a `--week` argument, defaulting to the latest snapshot week
pub fn resolve_week(engine: &KpiEngine, week: Option<&str>) -> Result<WeekId> {
    match week {
        Some(raw) => raw.parse::<WeekId>().map_err(anyhow::Error::msg),
        None => Ok(engine.snapshots().latest()),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
