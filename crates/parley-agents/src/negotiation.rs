//! The negotiation agent: a per-turn state machine over speech acts.
//!
//! Each turn the agent optionally opens the negotiation (initiator only,
//! first turn), then drains its unread messages in arrival order and reacts
//! to each one:
//!
//! | Received | Reaction |
//! |----------|----------|
//! | `PROPOSE(x)` | `ACCEPT(x)` if `x` is in its own top fraction, else `ASK_WHY(x)` |
//! | `ACCEPT(x)` | if it proposed or accepted `x`: commit and broadcast `COMMIT(x)` |
//! | `COMMIT(x)` | drop `x` from the pool (accepted or not); commit and re-broadcast if not yet committed |
//! | `ASK_WHY(x)` | `ARGUE` with its strongest supporting premise for `x` |
//! | `ARGUE(a)` | rebut `a` via the dialectical stack, or concede / move on |
//!
//! Once committed, an agent ignores everything except `COMMIT`.
//!
//! # Accepting the loss
//!
//! When an argument in favour of an item cannot be rebutted, the agent
//! accepts the item with a configured probability and otherwise proposes
//! its next most-preferred item. The draw is an integer roll in
//! `0..10000` against a per-10000 threshold derived from the probability.
//!
//! # Running out of items
//!
//! An agent that must give up its proposal and has nothing left to propose
//! accepts the best opponent offer still under dispute, or else the
//! opponent's most recent proposal. If the opponent never proposed anything
//! the agent becomes [`NegotiationStatus::Exhausted`] and sends nothing; the
//! negotiation then stays unfinished unless the opponent proposes again.

use std::collections::{BTreeSet, VecDeque};

use parley_types::{Act, Argument, Item, ItemCatalog, Message};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::argumentation::supporting_premises;
use crate::communication::{Communicator, MessageBus};
use crate::dialectic::Dialogue;
use crate::error::AgentError;
use crate::preferences::Preferences;

/// Upper bound (exclusive) of the accept-the-loss roll.
pub const ROLL_RANGE: u32 = 10_000;

// ---------------------------------------------------------------------------
// NegotiationConfig
// ---------------------------------------------------------------------------

/// Tunable parameters of one agent's negotiation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Share of the pool an item must rank within to be accepted outright.
    pub top_fraction: Decimal,
    /// Probability of accepting an item whose supporting argument could not
    /// be rebutted.
    pub accept_loss_probability: Decimal,
}

impl NegotiationConfig {
    /// Per-10000 threshold for the accept-the-loss roll.
    pub fn accept_loss_threshold(&self) -> u32 {
        let scaled = self
            .accept_loss_probability
            .saturating_mul(Decimal::from(ROLL_RANGE))
            .round();
        if scaled.is_sign_negative() {
            return 0;
        }
        scaled.to_u32().map_or(ROLL_RANGE, |t| t.min(ROLL_RANGE))
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            top_fraction: Decimal::new(1, 1),
            accept_loss_probability: Decimal::new(2, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// NegotiationStatus
// ---------------------------------------------------------------------------

/// Coarse protocol state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationStatus {
    /// Nothing proposed or received yet.
    Idle,
    /// An offer is on the table (made or being answered).
    Proposed,
    /// Exchanging arguments about an item.
    Arguing,
    /// Committed to an item; terminal.
    Committed,
    /// Nothing left to propose and no offer from the opponent to accept.
    /// A later `PROPOSE` from the opponent reopens the negotiation.
    Exhausted,
}

// ---------------------------------------------------------------------------
// NegotiationAgent
// ---------------------------------------------------------------------------

/// One party of the bilateral negotiation.
#[derive(Debug, Clone)]
pub struct NegotiationAgent {
    comm: Communicator,
    preferences: Preferences,
    config: NegotiationConfig,
    /// Every item this agent can decode messages about.
    catalog: ItemCatalog,
    /// Items still open for negotiation, in catalog order.
    pool: Vec<Item>,
    accepted: BTreeSet<Item>,
    disputed: BTreeSet<Item>,
    proposed: BTreeSet<Item>,
    /// The opponent's most recent proposal.
    last_offer: Option<Item>,
    committed: Option<Item>,
    /// Supporting arguments for the item last asked about, not yet sent.
    premise_cache: VecDeque<Argument>,
    dialogue: Dialogue,
    status: NegotiationStatus,
    initiator: bool,
    opened: bool,
}

impl NegotiationAgent {
    /// Register a new agent on `bus`. Every catalog item starts negotiable.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateName`] if the name is taken, or
    /// [`AgentError::ValueNotFound`] if `preferences` cannot score every
    /// catalog item.
    pub fn new(
        name: impl Into<String>,
        bus: &mut MessageBus,
        preferences: Preferences,
        catalog: ItemCatalog,
        config: NegotiationConfig,
    ) -> Result<Self, AgentError> {
        for item in &catalog {
            preferences.score(item)?;
        }
        let comm = Communicator::register(name, bus)?;
        let pool = catalog.as_slice().to_vec();

        Ok(Self {
            comm,
            preferences,
            config,
            catalog,
            pool,
            accepted: BTreeSet::new(),
            disputed: BTreeSet::new(),
            proposed: BTreeSet::new(),
            last_offer: None,
            committed: None,
            premise_cache: VecDeque::new(),
            dialogue: Dialogue::new(),
            status: NegotiationStatus::Idle,
            initiator: false,
            opened: false,
        })
    }

    /// Make this agent the one that opens the negotiation.
    pub const fn set_initiator(&mut self, initiator: bool) {
        self.initiator = initiator;
    }

    /// Whether this agent opens the negotiation.
    pub const fn is_initiator(&self) -> bool {
        self.initiator
    }

    /// The agent's name.
    pub fn name(&self) -> &str {
        self.comm.name()
    }

    /// Current protocol state.
    pub const fn status(&self) -> NegotiationStatus {
        self.status
    }

    /// The item this agent committed to, if any.
    pub const fn committed(&self) -> Option<&Item> {
        self.committed.as_ref()
    }

    /// Items this agent accepted.
    pub const fn accepted(&self) -> &BTreeSet<Item> {
        &self.accepted
    }

    /// Items this agent was offered and questioned.
    pub const fn disputed(&self) -> &BTreeSet<Item> {
        &self.disputed
    }

    /// Items this agent has proposed.
    pub const fn proposed(&self) -> &BTreeSet<Item> {
        &self.proposed
    }

    /// Items still open for negotiation.
    pub fn pool(&self) -> &[Item] {
        &self.pool
    }

    /// This agent's private preferences.
    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// The dispute currently in progress.
    pub const fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    /// Play one atomic turn: open if due, then handle every unread message.
    ///
    /// Returns the number of messages handled.
    ///
    /// # Errors
    ///
    /// Any failure aborts the turn: an undecodable message
    /// ([`AgentError::Parse`]), a routing failure, or an incomplete
    /// preference table.
    pub fn take_turn<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        rng: &mut R,
    ) -> Result<usize, AgentError> {
        if self.initiator && !self.opened {
            self.opened = true;
            self.open(bus, rng)?;
        }

        let messages = self.comm.unread(bus)?;
        let handled = messages.len();
        for message in messages {
            self.handle(bus, &message, rng)?;
        }
        Ok(handled)
    }

    /// Send the opening proposal: the most preferred item in the pool.
    fn open<R: Rng + ?Sized>(&mut self, bus: &mut MessageBus, rng: &mut R) -> Result<(), AgentError> {
        let opponent = bus
            .agent_names()
            .find(|n| *n != self.name())
            .map(str::to_owned)
            .ok_or_else(|| AgentError::NoOpponent(self.name().to_owned()))?;

        if !self.propose_next(bus, &opponent, None, rng)? {
            tracing::warn!(agent = self.name(), "nothing to propose");
        }
        Ok(())
    }

    fn handle<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        message: &Message,
        rng: &mut R,
    ) -> Result<(), AgentError> {
        let act = message.decode(&self.catalog)?;
        let from = message.sender();

        if self.committed.is_some() && !matches!(act, Act::Commit(_)) {
            tracing::warn!(
                agent = self.name(),
                from,
                performative = %message.performative(),
                "committed agent ignores message"
            );
            return Ok(());
        }

        tracing::debug!(agent = self.name(), %message, "handling message");

        match act {
            Act::Propose(item) => self.on_propose(bus, from, item),
            Act::Accept(item) => self.on_accept(bus, from, &item),
            Act::Commit(item) => self.on_commit(bus, &item),
            Act::AskWhy(item) => self.on_ask_why(bus, from, &item, rng),
            Act::Argue(argument) => self.on_argue(bus, from, &argument, rng),
        }
    }

    fn on_propose(&mut self, bus: &mut MessageBus, from: &str, item: Item) -> Result<(), AgentError> {
        self.status = NegotiationStatus::Proposed;
        self.last_offer = Some(item.clone());
        if self
            .preferences
            .is_top_fraction(&item, &self.pool, self.config.top_fraction)?
        {
            self.accept(bus, from, item)
        } else {
            self.comm.send(bus, from, &Act::AskWhy(item.clone()))?;
            self.disputed.insert(item);
            Ok(())
        }
    }

    fn on_accept(&mut self, bus: &mut MessageBus, from: &str, item: &Item) -> Result<(), AgentError> {
        if !self.proposed.contains(item) && !self.accepted.contains(item) {
            tracing::warn!(
                agent = self.name(),
                from,
                item = item.name(),
                "accept for an item never offered"
            );
            return Ok(());
        }
        self.commit(bus, item.clone())
    }

    fn on_commit(&mut self, bus: &mut MessageBus, item: &Item) -> Result<(), AgentError> {
        self.pool.retain(|i| i != item);
        if self.committed.is_none() {
            self.commit(bus, item.clone())?;
        }
        Ok(())
    }

    fn on_ask_why<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        from: &str,
        item: &Item,
        rng: &mut R,
    ) -> Result<(), AgentError> {
        self.status = NegotiationStatus::Arguing;
        self.dialogue.reset_for(item);

        let mut support: VecDeque<Argument> = supporting_premises(item, &self.preferences)?
            .into_iter()
            .map(|premise| Argument::new(item.clone(), true).with_equality(premise))
            .collect();

        let Some(strongest) = support.pop_front() else {
            tracing::info!(agent = self.name(), item = item.name(), "no support for own proposal, withdrawing");
            return self.withdraw(bus, from, item, rng);
        };

        self.premise_cache = support;
        self.dialogue.mark_used(&strongest);
        self.comm.send(bus, from, &Act::Argue(strongest))
    }

    fn on_argue<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        from: &str,
        argument: &Argument,
        rng: &mut R,
    ) -> Result<(), AgentError> {
        self.status = NegotiationStatus::Arguing;
        let item = &argument.item;

        let rebuttal = self.dialogue.process_argument(
            argument,
            &self.preferences,
            &self.pool,
            self.config.top_fraction,
        )?;
        if let Some(rebuttal) = rebuttal {
            return self.comm.send(bus, from, &Act::Argue(rebuttal));
        }

        if argument.decision {
            let roll = rng.random_range(0..ROLL_RANGE);
            if roll < self.config.accept_loss_threshold() {
                tracing::info!(agent = self.name(), item = item.name(), roll, "accepting the loss");
                return self.accept(bus, from, item.clone());
            }
            if !self.propose_next(bus, from, Some(item), rng)? {
                return self.accept(bus, from, item.clone());
            }
            return Ok(());
        }

        if let Some(replay) = self.next_cached_premise(item) {
            return self.comm.send(bus, from, &Act::Argue(replay));
        }
        self.withdraw(bus, from, item, rng)
    }

    /// Drop `item` and propose something else. When nothing is left to
    /// propose, accept the best open offer from the opponent, then its most
    /// recent proposal; with neither, the agent is exhausted.
    fn withdraw<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        to: &str,
        item: &Item,
        rng: &mut R,
    ) -> Result<(), AgentError> {
        self.pool.retain(|i| i != item);
        if self.propose_next(bus, to, Some(item), rng)? {
            return Ok(());
        }

        let offered: Vec<Item> = self
            .pool
            .iter()
            .filter(|i| self.disputed.contains(*i))
            .cloned()
            .collect();
        let fallback = self
            .preferences
            .most_preferred(&offered, rng)?
            .cloned()
            .or_else(|| self.last_offer.clone());
        if let Some(fallback) = fallback {
            return self.accept(bus, to, fallback);
        }

        tracing::warn!(agent = self.name(), "no item left to propose or accept");
        self.status = NegotiationStatus::Exhausted;
        Ok(())
    }

    /// Propose the most preferred pool item not yet proposed (and not
    /// `exclude`). Returns `false` if there is none.
    fn propose_next<R: Rng + ?Sized>(
        &mut self,
        bus: &mut MessageBus,
        to: &str,
        exclude: Option<&Item>,
        rng: &mut R,
    ) -> Result<bool, AgentError> {
        let candidates: Vec<Item> = self
            .pool
            .iter()
            .filter(|i| !self.proposed.contains(*i) && Some(*i) != exclude)
            .cloned()
            .collect();

        let Some(choice) = self.preferences.most_preferred(&candidates, rng)?.cloned() else {
            return Ok(false);
        };

        tracing::debug!(agent = self.name(), item = choice.name(), "proposing");
        self.comm.send(bus, to, &Act::Propose(choice.clone()))?;
        self.proposed.insert(choice);
        self.status = NegotiationStatus::Proposed;
        Ok(true)
    }

    fn accept(&mut self, bus: &mut MessageBus, to: &str, item: Item) -> Result<(), AgentError> {
        self.comm.send(bus, to, &Act::Accept(item.clone()))?;
        self.accepted.insert(item);
        Ok(())
    }

    fn commit(&mut self, bus: &mut MessageBus, item: Item) -> Result<(), AgentError> {
        tracing::info!(agent = self.name(), item = item.name(), "committed");
        self.pool.retain(|i| *i != item);
        self.comm.broadcast(bus, &Act::Commit(item.clone()))?;
        self.committed = Some(item);
        self.status = NegotiationStatus::Committed;
        Ok(())
    }

    /// Next cached supporting argument for `item` not yet sent.
    fn next_cached_premise(&mut self, item: &Item) -> Option<Argument> {
        while let Some(candidate) = self.premise_cache.pop_front() {
            if candidate.item == *item && self.dialogue.mark_used(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use parley_types::{Criterion, Performative, Value};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::communication::RunScope;

    fn items() -> ItemCatalog {
        [
            Item::new("ICED", "A super cool diesel engine"),
            Item::new("E", "A very quiet engine"),
        ]
        .into_iter()
        .collect()
    }

    fn uniform(catalog: &ItemCatalog, favourite: &str) -> Preferences {
        let mut prefs = Preferences::new(Criterion::ALL.to_vec()).unwrap();
        for item in catalog {
            let value = if item.name() == favourite { Value::VeryGood } else { Value::Bad };
            for criterion in Criterion::ALL {
                prefs.set_value(item, criterion, value);
            }
        }
        prefs
    }

    #[test]
    fn threshold_scales_probability() {
        let mut config = NegotiationConfig::default();
        assert_eq!(config.accept_loss_threshold(), 2000);
        config.accept_loss_probability = Decimal::ONE;
        assert_eq!(config.accept_loss_threshold(), ROLL_RANGE);
        config.accept_loss_probability = Decimal::from_str("0.00005").unwrap();
        assert_eq!(config.accept_loss_threshold(), 0);
    }

    #[test]
    fn construction_rejects_incomplete_preferences() {
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let prefs = Preferences::new(Criterion::ALL.to_vec()).unwrap();
        let err = NegotiationAgent::new("Alice", &mut bus, prefs, items(), NegotiationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AgentError::ValueNotFound { .. }));
    }

    #[test]
    fn initiator_opens_with_favourite() {
        let catalog = items();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut alice = NegotiationAgent::new(
            "Alice",
            &mut bus,
            uniform(&catalog, "E"),
            catalog.clone(),
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Bob").unwrap();
        alice.set_initiator(true);

        let mut rng = StdRng::seed_from_u64(1);
        alice.take_turn(&mut bus, &mut rng).unwrap();
        alice.take_turn(&mut bus, &mut rng).unwrap();

        let inbox = bus.mailbox("Bob").unwrap().all();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].performative(), Performative::Propose);
        assert_eq!(inbox[0].content(), "E");
        assert_eq!(alice.status(), NegotiationStatus::Proposed);
    }

    #[test]
    fn unwanted_proposal_is_questioned() {
        let catalog = items();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut bob = NegotiationAgent::new(
            "Bob",
            &mut bus,
            uniform(&catalog, "ICED"),
            catalog.clone(),
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Alice").unwrap();

        let e = catalog.get("E").unwrap().clone();
        bus.send(Message::direct("Alice", "Bob", &Act::Propose(e.clone())))
            .unwrap();
        bob.take_turn(&mut bus, &mut StdRng::seed_from_u64(1)).unwrap();

        let reply = &bus.mailbox("Alice").unwrap().all()[0];
        assert_eq!(reply.performative(), Performative::AskWhy);
        assert!(bob.disputed().contains(&e));
    }

    #[test]
    fn malformed_argument_aborts_turn() {
        let catalog = items();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut bob = NegotiationAgent::new(
            "Bob",
            &mut bus,
            uniform(&catalog, "ICED"),
            catalog,
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Alice").unwrap();

        bus.send(Message::new(
            "Alice",
            Some(String::from("Bob")),
            Performative::Argue,
            "E <- LOUDNESS=GOOD",
        ))
        .unwrap();
        let err = bob
            .take_turn(&mut bus, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, AgentError::Parse { .. }));
    }

    #[test]
    fn unsupported_last_item_exhausts_agent() {
        let catalog: ItemCatalog = [Item::new("ICED", "A super cool diesel engine")]
            .into_iter()
            .collect();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut alice = NegotiationAgent::new(
            "Alice",
            &mut bus,
            uniform(&catalog, "none"),
            catalog.clone(),
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Bob").unwrap();
        alice.set_initiator(true);
        let mut rng = StdRng::seed_from_u64(1);

        alice.take_turn(&mut bus, &mut rng).unwrap();
        let iced = catalog.get("ICED").unwrap().clone();
        bus.send(Message::direct("Bob", "Alice", &Act::AskWhy(iced)))
            .unwrap();
        alice.take_turn(&mut bus, &mut rng).unwrap();

        assert_eq!(alice.status(), NegotiationStatus::Exhausted);
        assert!(alice.pool().is_empty());
        assert!(alice.committed().is_none());
        let inbox = bus.mailbox("Bob").unwrap().all();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].performative(), Performative::Propose);
    }

    #[test]
    fn out_of_items_accepts_opponent_offer() {
        let catalog = items();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut alice = NegotiationAgent::new(
            "Alice",
            &mut bus,
            uniform(&catalog, "none"),
            catalog.clone(),
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Bob").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let iced = catalog.get("ICED").unwrap().clone();
        let e = catalog.get("E").unwrap().clone();

        // Ties rank in catalog order, so only ICED is in the top fraction.
        bus.send(Message::direct("Bob", "Alice", &Act::Propose(e.clone())))
            .unwrap();
        alice.take_turn(&mut bus, &mut rng).unwrap();
        assert!(alice.disputed().contains(&e));

        // No support for E: it is dropped and ICED proposed instead.
        bus.send(Message::direct("Bob", "Alice", &Act::AskWhy(e.clone())))
            .unwrap();
        alice.take_turn(&mut bus, &mut rng).unwrap();
        assert!(alice.proposed().contains(&iced));

        // No support for ICED either, and nothing left to propose.
        bus.send(Message::direct("Bob", "Alice", &Act::AskWhy(iced)))
            .unwrap();
        alice.take_turn(&mut bus, &mut rng).unwrap();

        let last = bus.mailbox("Bob").unwrap().all().last().unwrap().clone();
        assert_eq!(last.performative(), Performative::Accept);
        assert_eq!(last.content(), "E");
        assert_ne!(alice.status(), NegotiationStatus::Exhausted);
    }

    #[test]
    fn committed_agent_ignores_everything_but_commit() {
        let catalog = items();
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let mut bob = NegotiationAgent::new(
            "Bob",
            &mut bus,
            uniform(&catalog, "ICED"),
            catalog.clone(),
            NegotiationConfig::default(),
        )
        .unwrap();
        bus.register("Alice").unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let iced = catalog.get("ICED").unwrap().clone();
        bus.send(Message::broadcast("Alice", &Act::Commit(iced.clone())))
            .unwrap();
        bob.take_turn(&mut bus, &mut rng).unwrap();
        assert_eq!(bob.committed(), Some(&iced));
        assert_eq!(bob.status(), NegotiationStatus::Committed);
        assert!(!bob.pool().contains(&iced));

        let before = bus.mailbox("Alice").unwrap().len();
        let e = catalog.get("E").unwrap().clone();
        bus.send(Message::direct("Alice", "Bob", &Act::Propose(e)))
            .unwrap();
        bob.take_turn(&mut bus, &mut rng).unwrap();
        assert_eq!(bus.mailbox("Alice").unwrap().len(), before);
    }
}
