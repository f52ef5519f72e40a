//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// opspulse - Weekly supply-chain KPI comparison and alerts
#[derive(Parser)]
#[command(name = "opspulse")]
#[command(about = "Weekly supply-chain KPI comparison and alert classification", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Engine config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// KPI snapshot source (.csv or .toml); built-in seed data if omitted
    #[arg(long, global = true)]
    pub snapshots: Option<PathBuf>,

    /// Narrative insight source (.json or .toml); built-in seed data if omitted
    #[arg(long, global = true)]
    pub insights: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List weeks with KPI snapshots and insights
    Weeks,

    /// Compare a week's KPIs against the previous week
    Compare {
        /// Week to show (e.g. 23 or W23); defaults to the latest week
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Show the narrative insight for a week
    Insight {
        /// Week to show (e.g. 23 or W23); defaults to the latest week
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Explain a week's delivery score change
    RootCause {
        /// Week to analyze (e.g. 23 or W23); defaults to the latest week
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Week-over-week delivery trend across all known weeks
    Trend,

    /// Show the delivery metric tree and level alerts for a week
    Tree {
        /// Week to show (e.g. 23 or W23); defaults to the latest week
        #[arg(short, long)]
        week: Option<String>,
    },

    /// Simulate extra order load against a week's KPIs
    Simulate {
        /// Week to simulate from (e.g. 23 or W23); defaults to the latest week
        #[arg(short, long)]
        week: Option<String>,

        /// Order increase in percent; repeat for several scenarios (stress test if omitted)
        #[arg(long = "increase", value_name = "PCT", allow_negative_numbers = true)]
        increases: Vec<f64>,

        /// Stress test step in percent
        #[arg(long, default_value_t = 5.0)]
        step: f64,

        /// Stress test maximum increase in percent
        #[arg(long, default_value_t = 100.0)]
        max: f64,
    },

    /// Run the insight regeneration cycle and print each state change
    Regenerate,
}
