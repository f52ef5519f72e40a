//! Snapshot and narrative data sources
//!
//! Supported inputs:
//! - CSV snapshot exports (`week` plus one `*_score` column per metric).
//!   Several rows for the same week are averaged into one snapshot.
//! - TOML datasets with `[[snapshot]]` and `[[insight]]` tables
//! - JSON insight files (array of insight objects)
//!
//! The embedded seed dataset is used when no external source is configured.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{round_to, InsightRecord, KpiSnapshot, Metric, WeekId};

/// Embedded seed dataset (compiled into binary)
const SEED_DATASET: &str = include_str!("../../../data/seed.toml");

/// Snapshot and insight records loaded together
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dataset {
    #[serde(default, rename = "snapshot")]
    pub snapshots: Vec<KpiSnapshot>,
    #[serde(default, rename = "insight")]
    pub insights: Vec<InsightRecord>,
}

impl Dataset {
    /// Parse a TOML dataset; every snapshot value must be finite
    pub fn from_toml(content: &str) -> Result<Self> {
        let dataset: Dataset = toml::from_str(content)?;
        for snapshot in &dataset.snapshots {
            snapshot.validate()?;
        }
        Ok(dataset)
    }
}

/// The built-in dataset
pub fn seed_dataset() -> Result<Dataset> {
    Dataset::from_toml(SEED_DATASET)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    week: i64,
    delivery_score: f64,
    accuracy_score: f64,
    dispatch_score: f64,
    warehouse_score: f64,
    on_time_score: f64,
}

impl CsvRow {
    fn values(&self) -> [f64; 5] {
        [
            self.delivery_score,
            self.accuracy_score,
            self.dispatch_score,
            self.warehouse_score,
            self.on_time_score,
        ]
    }
}

/// Parse snapshot CSV, averaging rows per week; output is week-ascending
pub fn load_snapshots_csv<R: Read>(reader: R) -> Result<Vec<KpiSnapshot>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = std::iter::once("week")
        .chain(Metric::ALL.iter().map(|m| m.column()))
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Configuration(format!(
            "snapshot CSV is missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut totals: BTreeMap<WeekId, ([f64; 5], usize)> = BTreeMap::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let week = u32::try_from(row.week)
            .ok()
            .and_then(|w| WeekId::new(w).ok())
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "row {}: week must be a positive integer, got {}",
                    index + 1,
                    row.week
                ))
            })?;

        let values = row.values();
        let non_finite = Metric::ALL.iter().zip(values).find(|(_, v)| !v.is_finite());
        if let Some((metric, value)) = non_finite {
            return Err(Error::InvalidData(format!(
                "row {}: {} must be a finite number, got {}",
                index + 1,
                metric.column(),
                value
            )));
        }

        let (sums, count) = totals.entry(week).or_insert(([0.0; 5], 0));
        for (sum, value) in sums.iter_mut().zip(values) {
            *sum += value;
        }
        *count += 1;
    }

    let snapshots: Vec<KpiSnapshot> = totals
        .into_iter()
        .map(|(week, (sums, count))| {
            let means = sums.map(|sum| round_to(sum / count as f64, 2));
            KpiSnapshot::try_new(week, means)
        })
        .collect::<Result<_>>()?;

    tracing::debug!(weeks = snapshots.len(), "Loaded snapshot CSV");
    Ok(snapshots)
}

/// Load snapshots from a `.csv` or `.toml` file
pub fn load_snapshots_path(path: &Path) -> Result<Vec<KpiSnapshot>> {
    match extension(path).as_deref() {
        Some("csv") => load_snapshots_csv(fs::File::open(path)?),
        Some("toml") => Ok(Dataset::from_toml(&fs::read_to_string(path)?)?.snapshots),
        _ => Err(Error::InvalidData(format!(
            "unsupported snapshot file (expected .csv or .toml): {}",
            path.display()
        ))),
    }
}

/// Parse a JSON array of insight records
pub fn load_insights_json(content: &str) -> Result<Vec<InsightRecord>> {
    Ok(serde_json::from_str(content)?)
}

/// Load insights from a `.json` or `.toml` file
pub fn load_insights_path(path: &Path) -> Result<Vec<InsightRecord>> {
    let content = fs::read_to_string(path)?;
    match extension(path).as_deref() {
        Some("json") => load_insights_json(&content),
        Some("toml") => Ok(Dataset::from_toml(&content)?.insights),
        _ => Err(Error::InvalidData(format!(
            "unsupported insight file (expected .json or .toml): {}",
            path.display()
        ))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
