//! Engine configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/opspulse/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::analysis::{AlertClassifier, LoadModel};
use crate::error::Result;
use crate::insights::RegenerationConfig;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Validated engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineConfig {
    pub classifier: AlertClassifier,
    pub regeneration: RegenerationConfig,
    pub simulation: LoadModel,
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("opspulse").join("config").join("engine.toml"))
}

/// Load configuration (override first, then default)
pub fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    let candidate = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    let content = match candidate {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading engine config");
            fs::read_to_string(&path)?
        }
        Some(path) if override_path.is_some() => {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            DEFAULT_CONFIG.to_string()
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    classifier: Option<RawClassifier>,
    regeneration: Option<RawRegeneration>,
    simulation: Option<RawSimulation>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    alert_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRegeneration {
    latency_ms: Option<u64>,
    display_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSimulation {
    warehouse_elasticity: Option<f64>,
    dispatch_elasticity: Option<f64>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut config = EngineConfig::default();

    if let Some(threshold) = raw.classifier.and_then(|c| c.alert_threshold) {
        config.classifier = AlertClassifier::with_threshold(threshold)?;
    }

    if let Some(regeneration) = raw.regeneration {
        let latency = regeneration
            .latency_ms
            .map(Duration::from_millis)
            .unwrap_or(config.regeneration.latency);
        let display = regeneration
            .display_ms
            .map(Duration::from_millis)
            .unwrap_or(config.regeneration.display);
        config.regeneration = RegenerationConfig::new(latency, display)?;
    }

    if let Some(simulation) = raw.simulation {
        let defaults = config.simulation;
        config.simulation = LoadModel::new(
            simulation
                .warehouse_elasticity
                .unwrap_or(defaults.warehouse_elasticity()),
            simulation
                .dispatch_elasticity
                .unwrap_or(defaults.dispatch_elasticity()),
        )?;
    }

    Ok(config)
}
