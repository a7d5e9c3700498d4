//! Command-line argument parsing with clap.
//!
//! Every flag is optional. Flags that are given override the matching
//! field of the loaded [`SimulationConfig`].

use std::path::PathBuf;

use clap::Parser;
use parley_core::SimulationConfig;
use parley_core::config::ItemMode;
use rust_decimal::Decimal;

/// Parley: two agents negotiate over a set of items by exchanging arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file. Defaults apply when it does not exist.
    #[arg(short, long, env = "PARLEY_CONFIG", default_value = "parley-config.yaml")]
    pub config: PathBuf,

    /// Generate `item-N` items instead of the two preset engines.
    #[arg(long)]
    pub random_items: bool,

    /// Number of generated items (implies nothing without `--random-items`).
    #[arg(long, value_name = "N")]
    pub item_count: Option<usize>,

    /// Stop after this many ticks without agreement.
    #[arg(long, value_name = "N")]
    pub max_ticks: Option<u64>,

    /// Probability of accepting an item whose argument went unanswered.
    #[arg(long, value_name = "P")]
    pub accept_loss_probability: Option<Decimal>,

    /// Name of the agent that opens the negotiation.
    #[arg(long, value_name = "NAME")]
    pub initiator: Option<String>,

    /// Share of the pool an item must rank within to be accepted outright.
    #[arg(long, value_name = "K")]
    pub top_fraction: Option<Decimal>,

    /// Seed for every random choice in the run.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Queue messages until the next tick instead of delivering at once.
    #[arg(long)]
    pub deferred_delivery: bool,

    /// Print every delivered message as a JSON line.
    #[arg(long)]
    pub transcript: bool,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if self.random_items {
            config.items.mode = ItemMode::Random;
        }
        if let Some(count) = self.item_count {
            config.items.count = count;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.simulation.max_ticks = max_ticks;
        }
        if let Some(probability) = self.accept_loss_probability {
            config.negotiation.accept_loss_probability = probability;
        }
        if let Some(ref initiator) = self.initiator {
            config.negotiation.initiator = Some(initiator.clone());
        }
        if let Some(fraction) = self.top_fraction {
            config.negotiation.top_fraction = fraction;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if self.deferred_delivery {
            config.simulation.instant_delivery = false;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leaves_config_untouched() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        let mut config = SimulationConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(cli.config, PathBuf::from("parley-config.yaml"));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "parley",
            "--random-items",
            "--item-count",
            "7",
            "--max-ticks",
            "12",
            "--accept-loss-probability",
            "0.5",
            "--initiator",
            "Bob",
            "--top-fraction",
            "0.25",
            "--seed",
            "99",
            "--deferred-delivery",
            "--transcript",
        ])
        .unwrap();

        let mut config = SimulationConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.items.mode, ItemMode::Random);
        assert_eq!(config.items.count, 7);
        assert_eq!(config.simulation.max_ticks, 12);
        assert_eq!(config.simulation.seed, 99);
        assert!(!config.simulation.instant_delivery);
        assert_eq!(config.negotiation.accept_loss_probability, Decimal::new(5, 1));
        assert_eq!(config.negotiation.top_fraction, Decimal::new(25, 2));
        assert_eq!(config.negotiation.initiator.as_deref(), Some("Bob"));
        assert!(cli.transcript);
    }

    #[test]
    fn malformed_probability_is_rejected() {
        assert!(Cli::try_parse_from(["parley", "--accept-loss-probability", "lots"]).is_err());
    }
}
