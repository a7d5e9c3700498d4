//! Tick cycle: one round of the negotiation.
//!
//! Each tick runs these steps in order:
//!
//! 1. **Advance** -- move the clock forward.
//! 2. **Flush** -- deliver every message queued on the bus (deferred mode).
//! 3. **Turns** -- each agent takes exactly one atomic turn, in the fixed
//!    turn order: it drains its mailbox and emits its replies.
//!
//! The tick cycle is deterministic given the same initial state and seed.

use parley_agents::{AgentError, MessageBus, NegotiationAgent, NegotiationStatus};
use parley_types::Item;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::clock::{ClockError, TickClock};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Flushing the bus failed.
    #[error("bus error: {source}")]
    Bus {
        /// The underlying routing error.
        source: AgentError,
    },

    /// An agent's turn failed.
    #[error("agent error for {agent}: {source}")]
    Agent {
        /// The agent whose turn failed.
        agent: String,
        /// The underlying agent error.
        source: AgentError,
    },
}

/// Per-agent state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSummary {
    /// Agent name.
    pub name: String,
    /// Protocol state.
    pub status: NegotiationStatus,
    /// Committed item, if any.
    pub committed: Option<Item>,
    /// Messages handled during this tick's turn.
    pub handled: usize,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Messages dispatched by the flush step.
    pub flushed: usize,
    /// Mailbox deliveries during the whole tick.
    pub delivered: u64,
    /// Per-agent state, in turn order.
    pub agents: Vec<AgentSummary>,
}

/// The mutable state of one negotiation run.
#[derive(Debug)]
pub struct SimulationState {
    /// The tick clock.
    pub clock: TickClock,
    /// The run's only message bus.
    pub bus: MessageBus,
    /// Agents in turn order.
    pub agents: Vec<NegotiationAgent>,
    /// Seeded source for every random choice in the run.
    pub rng: StdRng,
}

impl SimulationState {
    /// Bundle a bus, its agents (in turn order), and the run's RNG.
    pub const fn new(bus: MessageBus, agents: Vec<NegotiationAgent>, rng: StdRng) -> Self {
        Self {
            clock: TickClock::new(),
            bus,
            agents,
            rng,
        }
    }

    /// Mark the agent named `name` as initiator, or the first agent when
    /// `name` is `None`. Call before [`Self::shuffle_turn_order`] so the
    /// default stays the first-registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if no agent has that name.
    pub fn choose_initiator(&mut self, name: Option<&str>) -> Result<(), AgentError> {
        let index = match name {
            Some(name) => self
                .agents
                .iter()
                .position(|a| a.name() == name)
                .ok_or_else(|| AgentError::AgentNotFound(name.to_owned()))?,
            None => 0,
        };
        for (i, agent) in self.agents.iter_mut().enumerate() {
            agent.set_initiator(i == index);
        }
        Ok(())
    }

    /// Shuffle the turn order. Called at most once, before the first tick.
    /// The initiator flag travels with its agent.
    pub fn shuffle_turn_order(&mut self) {
        self.agents.shuffle(&mut self.rng);
        debug!(
            order = ?self.agents.iter().map(NegotiationAgent::name).collect::<Vec<_>>(),
            "turn order shuffled"
        );
    }

    /// The item every agent committed to, if they all agree.
    pub fn converged_item(&self) -> Option<&Item> {
        let (first, rest) = self.agents.split_first()?;
        let item = first.committed()?;
        rest.iter()
            .all(|a| a.committed() == Some(item))
            .then_some(item)
    }
}

/// Execute one complete tick.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows, the flush hits an unknown
/// receiver, or any agent's turn fails. The run should stop on error.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.clock.advance()?;
    let delivered_before = state.bus.stats().delivered;

    let flushed = state
        .bus
        .flush()
        .map_err(|source| TickError::Bus { source })?;

    let mut agents = Vec::with_capacity(state.agents.len());
    for agent in &mut state.agents {
        let handled = agent
            .take_turn(&mut state.bus, &mut state.rng)
            .map_err(|source| TickError::Agent {
                agent: agent.name().to_owned(),
                source,
            })?;
        agents.push(AgentSummary {
            name: agent.name().to_owned(),
            status: agent.status(),
            committed: agent.committed().cloned(),
            handled,
        });
    }

    let delivered = state
        .bus
        .stats()
        .delivered
        .saturating_sub(delivered_before);
    debug!(tick, flushed, delivered, "tick complete");

    Ok(TickSummary {
        tick,
        flushed,
        delivered,
        agents,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_agents::{NegotiationConfig, Preferences, RunScope};
    use parley_types::{Criterion, ItemCatalog, Value};
    use rand::SeedableRng;

    use super::*;

    fn catalog() -> ItemCatalog {
        [
            Item::new("ICED", "A super cool diesel engine"),
            Item::new("E", "A very quiet engine"),
        ]
        .into_iter()
        .collect()
    }

    fn prefer_iced(catalog: &ItemCatalog) -> Preferences {
        let mut prefs = Preferences::new(Criterion::ALL.to_vec()).unwrap();
        for item in catalog {
            let value = if item.name() == "ICED" { Value::VeryGood } else { Value::Good };
            for criterion in Criterion::ALL {
                prefs.set_value(item, criterion, value);
            }
        }
        prefs
    }

    fn state(instant: bool) -> SimulationState {
        let catalog = catalog();
        let mut bus = RunScope::new().open_bus(instant).unwrap();
        let agents = ["Alice", "Bob"]
            .into_iter()
            .map(|name| {
                NegotiationAgent::new(
                    name,
                    &mut bus,
                    prefer_iced(&catalog),
                    catalog.clone(),
                    NegotiationConfig::default(),
                )
                .unwrap()
            })
            .collect();
        SimulationState::new(bus, agents, StdRng::seed_from_u64(9))
    }

    #[test]
    fn initiator_defaults_to_first_agent() {
        let mut state = state(true);
        state.choose_initiator(None).unwrap();
        assert!(state.agents[0].is_initiator());
        assert!(!state.agents[1].is_initiator());

        state.choose_initiator(Some("Bob")).unwrap();
        assert!(!state.agents[0].is_initiator());
        assert!(state.agents[1].is_initiator());

        assert!(matches!(
            state.choose_initiator(Some("Zed")),
            Err(AgentError::AgentNotFound(_))
        ));
    }

    #[test]
    fn initiator_survives_shuffle() {
        let mut state = state(true);
        state.choose_initiator(None).unwrap();
        state.shuffle_turn_order();
        let alice = state.agents.iter().find(|a| a.name() == "Alice").unwrap();
        assert!(alice.is_initiator());
        assert_eq!(state.agents.iter().filter(|a| a.is_initiator()).count(), 1);
    }

    #[test]
    fn tick_advances_clock_and_reports_agents() {
        let mut state = state(true);
        state.choose_initiator(None).unwrap();
        let summary = run_tick(&mut state).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.agents.len(), 2);
        assert_eq!(summary.agents[0].name, "Alice");
        // PROPOSE then the reply to it.
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.agents[1].handled, 1);
    }

    #[test]
    fn deferred_messages_arrive_on_next_tick() {
        let mut state = state(false);
        state.choose_initiator(None).unwrap();

        let first = run_tick(&mut state).unwrap();
        assert_eq!(first.flushed, 0);
        assert_eq!(first.delivered, 0);
        assert_eq!(state.bus.pending_len(), 1);

        let second = run_tick(&mut state).unwrap();
        assert_eq!(second.flushed, 1);
        assert_eq!(second.agents[1].handled, 1);
    }

    #[test]
    fn converged_item_requires_agreement() {
        let mut state = state(true);
        assert!(state.converged_item().is_none());
        state.choose_initiator(None).unwrap();
        run_tick(&mut state).unwrap();
        assert!(state.converged_item().is_none());
        run_tick(&mut state).unwrap();
        assert_eq!(state.converged_item().unwrap().name(), "ICED");
    }
}
