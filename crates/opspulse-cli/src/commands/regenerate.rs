//! Insight regeneration command

use anyhow::{Context, Result};
use opspulse_core::{InsightRegenerationController, RegenerationConfig, RegenerationState};
use serde::Serialize;
use tokio::time::Instant;

use super::core::{print_json, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub state: RegenerationState,
    pub elapsed_ms: u64,
}

/// Drive one regeneration cycle until the controller returns to idle
pub async fn run_regeneration(config: RegenerationConfig) -> Result<Vec<Transition>> {
    let controller = InsightRegenerationController::new(config);
    let mut rx = controller.subscribe();
    let started = Instant::now();

    if !controller.start() {
        anyhow::bail!("Regeneration could not start from state {}", controller.state());
    }

    let mut transitions = Vec::new();
    loop {
        rx.changed()
            .await
            .context("Regeneration controller closed unexpectedly")?;
        let state = *rx.borrow_and_update();
        transitions.push(Transition {
            state,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        if matches!(state, RegenerationState::Idle | RegenerationState::Cancelled) {
            break;
        }
    }

    Ok(transitions)
}

pub async fn cmd_regenerate(config: RegenerationConfig, format: OutputFormat) -> Result<()> {
    let transitions = run_regeneration(config).await?;

    if format == OutputFormat::Json {
        return print_json(&transitions);
    }

    for t in &transitions {
        let note = match t.state {
            RegenerationState::Running => "analyzing",
            RegenerationState::Completed => "insight refreshed",
            RegenerationState::Idle => "ready",
            RegenerationState::Cancelled => "cancelled",
        };
        println!("{:>6} ms  {:<10} {}", t.elapsed_ms, t.state.as_str(), note);
    }
    Ok(())
}
