//! Bounded simulation loop.
//!
//! [`run_simulation`] repeats [`run_tick`] until both agents hold the same
//! commitment or the tick budget is spent, then reports why it stopped.
//!
//! [`run_tick`]: crate::tick::run_tick

use parley_types::Item;
use tracing::{info, warn};

use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Both agents committed to the same item.
    Converged {
        /// The agreed item.
        item: Item,
    },
    /// Reached `max_ticks` without agreement.
    MaxTicksReached,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

impl SimulationResult {
    /// The agreed item, if the negotiation converged.
    pub const fn agreed_item(&self) -> Option<&Item> {
        match &self.end_reason {
            EndReason::Converged { item } => Some(item),
            EndReason::MaxTicksReached => None,
        }
    }
}

/// Run ticks until convergence or until `max_ticks` ticks have run.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails; failures are never retried.
pub fn run_simulation(
    state: &mut SimulationState,
    max_ticks: u64,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks,
        agents = state.agents.len(),
        instant_delivery = state.bus.instant_delivery(),
        "Simulation starting"
    );

    while total_ticks < max_ticks {
        let summary = tick::run_tick(state)?;
        total_ticks = total_ticks.saturating_add(1);

        if let Some(item) = state.converged_item() {
            info!(tick = summary.tick, item = item.name(), "Negotiation converged");
            return Ok(SimulationResult {
                end_reason: EndReason::Converged { item: item.clone() },
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);
    }

    info!(max_ticks, "Tick limit reached");
    Ok(SimulationResult {
        end_reason: EndReason::MaxTicksReached,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Log the end of the run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        for agent in &summary.agents {
            info!(
                agent = %agent.name,
                status = ?agent.status,
                committed = agent.committed.as_ref().map(Item::name),
                "Final agent state"
            );
        }
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
