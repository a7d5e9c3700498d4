//! Error types for the Parley engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the run itself.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: parley_core::ConfigError,
    },

    /// Preference loading, bus setup, or agent registration failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: parley_agents::AgentError,
    },

    /// The simulation run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: parley_core::RunnerError,
    },

    /// Writing the transcript failed.
    #[error("transcript error: {source}")]
    Transcript {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
