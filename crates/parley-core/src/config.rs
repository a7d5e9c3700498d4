//! Configuration loading and typed config structures for a Parley run.
//!
//! The configuration lives in `parley-config.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure, a loader, and the
//! validation rules a run depends on. Every field has a default, so a
//! missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use parley_agents::NegotiationConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible run.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `parley-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Run boundaries and delivery mode.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Negotiation behaviour shared by both agents.
    #[serde(default)]
    pub negotiation: NegotiationSettings,

    /// Where the negotiable items come from.
    #[serde(default)]
    pub items: ItemsConfig,

    /// The two negotiating agents, in registration order.
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            negotiation: NegotiationSettings::default(),
            items: ItemsConfig::default(),
            agents: default_agents(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if the file exists, otherwise use the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`SimulationConfig::from_file`] for an existing file.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check the rules a run depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { reason })
        };

        let [first, second] = self.agents.as_slice() else {
            return invalid(format!("exactly 2 agents required, got {}", self.agents.len()));
        };
        if first.name == second.name {
            return invalid(format!("agent names must differ, both are \"{}\"", first.name));
        }
        if let Some(initiator) = &self.negotiation.initiator
            && !self.agents.iter().any(|a| a.name == *initiator)
        {
            return invalid(format!("initiator \"{initiator}\" is not a configured agent"));
        }

        let fraction = self.negotiation.top_fraction;
        if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
            return invalid(format!("top_fraction must be in (0, 1], got {fraction}"));
        }
        let probability = self.negotiation.accept_loss_probability;
        if probability < Decimal::ZERO || probability > Decimal::ONE {
            return invalid(format!(
                "accept_loss_probability must be in [0, 1], got {probability}"
            ));
        }
        if self.items.count == 0 {
            return invalid(String::from("items.count must be at least 1"));
        }
        Ok(())
    }
}

/// Run boundaries and delivery mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Ticks to run before reporting the negotiation as unfinished.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Deliver messages as soon as they are sent (otherwise at the next flush).
    #[serde(default = "default_true")]
    pub instant_delivery: bool,

    /// Shuffle the agent turn order once at the start of the run. The
    /// default initiator is still the first agent listed under `agents`.
    #[serde(default)]
    pub shuffle_turn_order: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            seed: default_seed(),
            instant_delivery: true,
            shuffle_turn_order: false,
        }
    }
}

/// Negotiation behaviour shared by both agents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NegotiationSettings {
    /// Share of the pool an item must rank within to be accepted outright.
    #[serde(default = "default_top_fraction")]
    pub top_fraction: Decimal,

    /// Probability of accepting an item whose argument cannot be rebutted.
    #[serde(default = "default_accept_loss_probability")]
    pub accept_loss_probability: Decimal,

    /// Agent that sends the opening proposal (default: the first agent).
    #[serde(default)]
    pub initiator: Option<String>,
}

impl NegotiationSettings {
    /// The per-agent negotiation parameters.
    pub const fn agent_config(&self) -> NegotiationConfig {
        NegotiationConfig {
            top_fraction: self.top_fraction,
            accept_loss_probability: self.accept_loss_probability,
        }
    }
}

impl Default for NegotiationSettings {
    fn default() -> Self {
        Self {
            top_fraction: default_top_fraction(),
            accept_loss_probability: default_accept_loss_probability(),
            initiator: None,
        }
    }
}

/// How the item catalog is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemMode {
    /// The two preset engines.
    #[default]
    Preset,
    /// `count` generated items.
    Random,
}

/// Where the negotiable items come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemsConfig {
    /// Preset or generated items.
    #[serde(default)]
    pub mode: ItemMode,

    /// Number of generated items (random mode only).
    #[serde(default = "default_item_count")]
    pub count: usize,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            mode: ItemMode::Preset,
            count: default_item_count(),
        }
    }
}

/// One negotiating agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    /// Unique agent name.
    pub name: String,

    /// Directory holding `criteria.csv` and `values.csv`; random
    /// preferences are generated when absent.
    #[serde(default)]
    pub preferences_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// An agent with generated preferences.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            preferences_dir: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_max_ticks() -> u64 {
    50
}

const fn default_seed() -> u64 {
    42
}

const fn default_true() -> bool {
    true
}

fn default_top_fraction() -> Decimal {
    Decimal::new(1, 1)
}

fn default_accept_loss_probability() -> Decimal {
    Decimal::new(2, 1)
}

const fn default_item_count() -> usize {
    10
}

fn default_agents() -> Vec<AgentConfig> {
    vec![AgentConfig::named("Alice"), AgentConfig::named("Bob")]
}

fn default_log_level() -> String {
    "info".to_owned()
}
