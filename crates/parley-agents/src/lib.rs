//! Preferences, argumentation, messaging, and negotiation agents.
//!
//! This crate holds all agent-side logic of a Parley run. It sits between
//! `parley-types` (the data structures and wire grammar) and `parley-core`
//! (the tick loop that schedules agent turns).
//!
//! # Modules
//!
//! - [`preferences`] -- Criterion ranking, value table, scoring, top fraction,
//!   CSV loading and random generation ([`Preferences`])
//! - [`argumentation`] -- Supporting/attacking premises and rebuttal
//!   construction ([`build_attack`])
//! - [`dialectic`] -- Frames, the dialectical stack, and the rebuttal search
//!   ([`Dialogue`])
//! - [`communication`] -- Mailboxes, the message bus, and the per-run bus
//!   guard ([`MessageBus`], [`RunScope`])
//! - [`negotiation`] -- The per-turn negotiation state machine
//!   ([`NegotiationAgent`])
//! - [`error`] -- Error types for all agent operations ([`AgentError`])

pub mod argumentation;
pub mod communication;
pub mod dialectic;
pub mod error;
pub mod negotiation;
pub mod preferences;

// Re-export primary types at crate root for convenience.
pub use argumentation::{attacking_premises, build_attack, supporting_premises};
pub use communication::{BusStats, Communicator, Mailbox, MessageBus, RunScope};
pub use dialectic::{DialecticalStack, Dialogue, ExtendedArgument, cancels};
pub use error::AgentError;
pub use negotiation::{NegotiationAgent, NegotiationConfig, NegotiationStatus, ROLL_RANGE};
pub use preferences::{Preferences, top_fraction_len};
