//! opspulse CLI - Weekly supply-chain KPI comparison
//!
//! Usage:
//!   opspulse weeks                 List known weeks
//!   opspulse compare --week 23     Compare a week against its baseline
//!   opspulse insight --week 23     Show the narrative insight
//!   opspulse root-cause --week 23  Explain the delivery score change
//!   opspulse trend                 Week-over-week delivery trend
//!   opspulse tree --week 23        Metric tree and level alerts
//!   opspulse simulate --week 23    What-if order load stress test
//!   opspulse regenerate            Run the insight regeneration cycle

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let sources = commands::Sources {
        config: cli.config.as_deref(),
        snapshots: cli.snapshots.as_deref(),
        insights: cli.insights.as_deref(),
    };
    let format = commands::OutputFormat::from_flag(cli.json);

    match cli.command {
        Commands::Weeks => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_weeks(&engine, format)
        }
        Commands::Compare { week } => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_compare(&engine, week.as_deref(), format)
        }
        Commands::Insight { week } => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_insight(&engine, week.as_deref(), format)
        }
        Commands::RootCause { week } => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_root_cause(&engine, week.as_deref(), format)
        }
        Commands::Trend => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_trend(&engine, format)
        }
        Commands::Tree { week } => {
            let engine = commands::open_engine(&sources)?;
            commands::cmd_tree(&engine, week.as_deref(), format)
        }
        Commands::Simulate {
            week,
            increases,
            step,
            max,
        } => {
            let engine = commands::open_engine(&sources)?;
            let plan = commands::LoadPlan::from_args(increases, step, max);
            commands::cmd_simulate(&engine, week.as_deref(), &plan, format)
        }
        Commands::Regenerate => {
            let config = commands::open_config(&sources)?;
            commands::cmd_regenerate(config.regeneration, format).await
        }
    }
}
