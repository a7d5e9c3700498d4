//! Tick clock, configuration, and run orchestration for the Parley simulation.
//!
//! This crate owns the tick cycle that drives a negotiation: flush the bus,
//! then let each agent take one turn. It knows nothing about how agents
//! decide; that lives in `parley-agents`.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter with checked advance.
//! - [`config`] -- Configuration loading from `parley-config.yaml` into
//!   strongly-typed structs, with validation.
//! - [`tick`] -- The single-tick cycle and the run state it mutates.
//! - [`runner`] -- The bounded run loop and end-of-run reporting.

pub mod clock;
pub mod config;
pub mod runner;
pub mod tick;

pub use clock::{ClockError, TickClock};
pub use config::{ConfigError, SimulationConfig};
pub use runner::{EndReason, RunnerError, SimulationResult, log_simulation_end, run_simulation};
pub use tick::{AgentSummary, SimulationState, TickError, TickSummary, run_tick};
