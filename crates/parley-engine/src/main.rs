//! Negotiation engine binary for the Parley simulation.
//!
//! Wires together configuration, scenario assembly, and the run loop, then
//! reports the outcome on stdout.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line flags
//! 2. Load `parley-config.yaml` (defaults when absent) and apply overrides
//! 3. Initialize structured logging (tracing, to stderr)
//! 4. Build items, preferences, the bus, and both agents
//! 5. Run ticks until agreement or the tick budget is spent
//! 6. Print the outcome (and the transcript, when asked)

mod cli;
mod error;
mod spawner;

use clap::Parser;
use parley_core::{EndReason, SimulationConfig, SimulationResult, runner};
use parley_types::Message;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario assembly, or the run fails.
/// An unfinished negotiation is not an error.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!(
        seed = config.simulation.seed,
        max_ticks = config.simulation.max_ticks,
        items = ?config.items.mode,
        instant_delivery = config.simulation.instant_delivery,
        top_fraction = %config.negotiation.top_fraction,
        accept_loss_probability = %config.negotiation.accept_loss_probability,
        "Configuration loaded"
    );

    let mut state = spawner::spawn(&config)?;
    info!(agents = state.agents.len(), "Simulation state assembled, entering tick loop");

    let result = runner::run_simulation(&mut state, config.simulation.max_ticks)?;
    runner::log_simulation_end(&result);

    if cli.transcript {
        print_transcript(state.bus.transcript())?;
    }
    report(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "parley shutdown complete"
    );
    Ok(())
}

/// Load the config file named on the command line and apply flag overrides.
fn load_config(cli: &Cli) -> Result<SimulationConfig, EngineError> {
    let mut config = SimulationConfig::from_file_or_default(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// One JSON object per delivered message.
fn print_transcript(transcript: &[Message]) -> Result<(), EngineError> {
    for message in transcript {
        println!("{}", serde_json::to_string(message)?);
    }
    Ok(())
}

fn report(result: &SimulationResult) {
    match result.end_reason {
        EndReason::Converged { ref item } => {
            println!(
                "Negotiation converged on {item} after {} ticks",
                result.total_ticks
            );
        }
        EndReason::MaxTicksReached => {
            println!("Negotiation not finished after {} ticks", result.total_ticks);
        }
    }
}
