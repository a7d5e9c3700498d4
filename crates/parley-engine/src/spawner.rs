//! Scenario assembly: items, preferences, bus, and agents.
//!
//! The spawner turns a validated [`SimulationConfig`] into a ready-to-run
//! [`SimulationState`]. Items come from the preset pair of engines or are
//! generated. Each agent's preferences are loaded from its directory when
//! one is configured (which may add items to the catalog) and generated at
//! random otherwise, once the catalog is final.

use parley_agents::{NegotiationAgent, Preferences, RunScope};
use parley_core::config::{AgentConfig, ItemMode};
use parley_core::{SimulationConfig, SimulationState};
use parley_types::{Item, ItemCatalog};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Items
// -----------------------------------------------------------------------

/// The two engines negotiated over by default.
const PRESET_ITEMS: &[(&str, &str)] = &[
    ("ICED", "A super cool diesel engine"),
    ("E", "A very quiet engine"),
];

/// Build the initial catalog for `mode`.
pub fn build_catalog(mode: ItemMode, count: usize) -> ItemCatalog {
    match mode {
        ItemMode::Preset => PRESET_ITEMS
            .iter()
            .map(|(name, description)| Item::new(*name, *description))
            .collect(),
        ItemMode::Random => (1..=count)
            .map(|i| Item::new(format!("item-{i}"), format!("Generated item number {i}")))
            .collect(),
    }
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Assemble the full run state from `config`.
///
/// The returned state owns the run's only bus and a [`StdRng`] seeded from
/// `config.simulation.seed`; preference generation draws from the same RNG.
///
/// # Errors
///
/// Returns [`EngineError::Agent`] if a preference directory cannot be
/// loaded, an agent cannot score every item, or the initiator is unknown.
pub fn spawn(config: &SimulationConfig) -> Result<SimulationState, EngineError> {
    let mut rng = StdRng::seed_from_u64(config.simulation.seed);
    let mut catalog = build_catalog(config.items.mode, config.items.count);

    let loaded = load_preferences(&config.agents, &mut catalog)?;
    info!(items = catalog.len(), "Item catalog ready");

    let mut scope = RunScope::new();
    let mut bus = scope.open_bus(config.simulation.instant_delivery)?;

    let negotiation = config.negotiation.agent_config();
    let mut agents = Vec::with_capacity(config.agents.len());
    for (agent_config, preferences) in config.agents.iter().zip(loaded) {
        let preferences =
            preferences.unwrap_or_else(|| Preferences::generate_random(&catalog, &mut rng));
        info!(
            agent = %agent_config.name,
            ranking = ?preferences.ranking(),
            "Agent spawned"
        );
        agents.push(NegotiationAgent::new(
            agent_config.name.clone(),
            &mut bus,
            preferences,
            catalog.clone(),
            negotiation,
        )?);
    }

    let mut state = SimulationState::new(bus, agents, rng);
    state.choose_initiator(config.negotiation.initiator.as_deref())?;
    if config.simulation.shuffle_turn_order {
        state.shuffle_turn_order();
    }
    Ok(state)
}

/// Load file-backed preferences, in agent order. Agents without a
/// directory get `None`.
fn load_preferences(
    agents: &[AgentConfig],
    catalog: &mut ItemCatalog,
) -> Result<Vec<Option<Preferences>>, EngineError> {
    let mut loaded = Vec::with_capacity(agents.len());
    for agent in agents {
        let Some(ref dir) = agent.preferences_dir else {
            loaded.push(None);
            continue;
        };
        let (preferences, discovered) = Preferences::load(dir, catalog)?;
        info!(
            agent = %agent.name,
            dir = %dir.display(),
            discovered = discovered.len(),
            "Preferences loaded"
        );
        loaded.push(Some(preferences));
    }
    Ok(loaded)
}
