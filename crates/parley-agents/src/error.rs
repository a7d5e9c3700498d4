//! Error types for the parley-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Every failure is fatal to the operation that raised it: the simulation is
//! deterministic and turn-based, so nothing here is retried.

use std::path::PathBuf;

use parley_types::{ArgumentParseError, Criterion};

/// Errors that can occur during agent, messaging, and preference operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A message was addressed to a name no registered agent carries.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// An agent with this name is already registered on the bus.
    #[error("duplicate agent name: {0}")]
    DuplicateName(String),

    /// A message bus was already opened for this run.
    #[error("a message bus is already active for this run")]
    BusAlreadyActive,

    /// The agent has no registered counterpart to address.
    #[error("agent {0} has no one to negotiate with")]
    NoOpponent(String),

    /// The preference table has no value for this (item, criterion) pair.
    #[error("no value found for item \"{item}\" and criterion {criterion}")]
    ValueNotFound {
        /// The item that was looked up.
        item: String,
        /// The criterion that was looked up.
        criterion: Criterion,
    },

    /// The criterion ranking is not a permutation of all criteria.
    #[error("invalid criterion ranking: {reason}")]
    InvalidRanking {
        /// Description of what is wrong with the ranking.
        reason: String,
    },

    /// An item name is not part of this agent's catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// A received message could not be decoded.
    #[error("failed to parse message content: {source}")]
    Parse {
        /// The underlying parse error.
        #[from]
        source: ArgumentParseError,
    },

    /// A preference table file could not be read or is malformed.
    #[error("preference file {path}: {reason}")]
    PreferenceFile {
        /// The file being read.
        path: PathBuf,
        /// Description of the failure (I/O error or offending line).
        reason: String,
    },
}
