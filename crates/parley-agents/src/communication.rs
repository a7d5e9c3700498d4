//! Message routing between named agents.
//!
//! # Architecture
//!
//! The [`MessageBus`] owns one [`Mailbox`] per registered agent and routes
//! every [`Message`] either directly to its receiver or, for a broadcast, to
//! every registered agent except the sender. In instant-delivery mode (the
//! default) [`MessageBus::send`] dispatches immediately; otherwise messages
//! wait in a FIFO queue until [`MessageBus::flush`].
//!
//! Exactly one bus exists per simulation run. It is obtained from a
//! [`RunScope`], which refuses to open a second one, and is then passed by
//! `&mut` to whoever needs it. Agents reach it through their
//! [`Communicator`].

use std::collections::VecDeque;

use parley_types::{Act, Message, Performative};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

// ---------------------------------------------------------------------------
// Mailbox
// ---------------------------------------------------------------------------

/// Ordered log of the messages one agent has received.
///
/// The log only grows. An unread cursor marks how far [`Mailbox::unread`]
/// has already returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    owner: String,
    messages: Vec<Message>,
    read_cursor: usize,
}

impl Mailbox {
    /// Create an empty mailbox for `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            messages: Vec::new(),
            read_cursor: 0,
        }
    }

    /// The agent that owns this mailbox.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Append a message to the log.
    pub fn receive(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full log in arrival order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Messages not returned by any earlier call, in arrival order.
    ///
    /// Advances the cursor, so each message is returned at most once.
    pub fn unread(&mut self) -> Vec<Message> {
        let fresh = self
            .messages
            .get(self.read_cursor..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default();
        self.read_cursor = self.messages.len();
        fresh
    }

    /// Number of messages the next [`Mailbox::unread`] call would return.
    pub fn unread_count(&self) -> usize {
        self.messages.len().saturating_sub(self.read_cursor)
    }

    /// Every received message with the given performative.
    pub fn by_performative(&self, performative: Performative) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.performative() == performative)
            .collect()
    }

    /// Every received message from the given sender.
    pub fn by_sender(&self, sender: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.sender() == sender)
            .collect()
    }

    /// Total number of received messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been received yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BusStats
// ---------------------------------------------------------------------------

/// Running counters kept by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusStats {
    /// Messages accepted by [`MessageBus::send`].
    pub sent: u64,
    /// Broadcast messages among those sent.
    pub broadcasts: u64,
    /// Individual mailbox deliveries (a broadcast counts once per receiver).
    pub delivered: u64,
}

// ---------------------------------------------------------------------------
// MessageBus
// ---------------------------------------------------------------------------

/// Routes messages to the mailboxes of registered agents.
#[derive(Debug)]
pub struct MessageBus {
    /// One mailbox per agent, in registration order.
    mailboxes: Vec<Mailbox>,
    /// Messages waiting for the next flush (deferred mode only).
    pending: VecDeque<Message>,
    instant_delivery: bool,
    /// Every delivered message, individually addressed, in delivery order.
    transcript: Vec<Message>,
    stats: BusStats,
}

impl MessageBus {
    /// Only [`RunScope::open_bus`] constructs a bus.
    const fn new(instant_delivery: bool) -> Self {
        Self {
            mailboxes: Vec::new(),
            pending: VecDeque::new(),
            instant_delivery,
            transcript: Vec::new(),
            stats: BusStats {
                sent: 0,
                broadcasts: 0,
                delivered: 0,
            },
        }
    }

    /// Register an agent and create its mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateName`] if the name is taken.
    pub fn register(&mut self, name: &str) -> Result<(), AgentError> {
        if self.is_registered(name) {
            return Err(AgentError::DuplicateName(name.to_owned()));
        }
        self.mailboxes.push(Mailbox::new(name));
        tracing::debug!(agent = name, "agent registered on message bus");
        Ok(())
    }

    /// Whether an agent with this name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.mailboxes.iter().any(|m| m.owner() == name)
    }

    /// Registered agent names in registration order.
    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.mailboxes.iter().map(Mailbox::owner)
    }

    /// Whether `send` delivers immediately.
    pub const fn instant_delivery(&self) -> bool {
        self.instant_delivery
    }

    /// Switch between immediate and deferred delivery.
    ///
    /// Messages already queued stay queued until the next flush.
    pub const fn set_instant_delivery(&mut self, instant: bool) {
        self.instant_delivery = instant;
    }

    /// Submit a message: dispatch it now in instant mode, queue it otherwise.
    ///
    /// # Errors
    ///
    /// In instant mode, returns [`AgentError::AgentNotFound`] if the
    /// receiver is not registered.
    pub fn send(&mut self, message: Message) -> Result<(), AgentError> {
        self.stats.sent = self.stats.sent.saturating_add(1);
        if message.is_broadcast() {
            self.stats.broadcasts = self.stats.broadcasts.saturating_add(1);
        }

        if self.instant_delivery {
            self.dispatch(message)
        } else {
            self.pending.push_back(message);
            Ok(())
        }
    }

    /// Deliver a message now.
    ///
    /// A broadcast is copied once per other registered agent, each copy
    /// addressed to that agent. The sender never receives its own broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the receiver is not registered.
    pub fn dispatch(&mut self, message: Message) -> Result<(), AgentError> {
        let Some(receiver) = message.receiver() else {
            let receivers: Vec<String> = self
                .agent_names()
                .filter(|name| *name != message.sender())
                .map(str::to_owned)
                .collect();
            for receiver in receivers {
                let copy = message.readdressed(&receiver);
                self.deliver(&receiver, copy)?;
            }
            return Ok(());
        };

        let receiver = receiver.to_owned();
        self.deliver(&receiver, message)
    }

    /// Dispatch every queued message in submission order and empty the
    /// queue. Returns the number of messages dispatched.
    ///
    /// # Errors
    ///
    /// Stops at the first message whose receiver is unknown and returns
    /// [`AgentError::AgentNotFound`]; later messages stay queued.
    pub fn flush(&mut self) -> Result<usize, AgentError> {
        let mut flushed: usize = 0;
        while let Some(message) = self.pending.pop_front() {
            self.dispatch(message)?;
            flushed = flushed.saturating_add(1);
        }
        Ok(flushed)
    }

    /// Number of messages waiting for a flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The mailbox of a registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] for an unknown name.
    pub fn mailbox(&self, name: &str) -> Result<&Mailbox, AgentError> {
        self.mailboxes
            .iter()
            .find(|m| m.owner() == name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_owned()))
    }

    /// Mutable access to the mailbox of a registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] for an unknown name.
    pub fn mailbox_mut(&mut self, name: &str) -> Result<&mut Mailbox, AgentError> {
        self.mailboxes
            .iter_mut()
            .find(|m| m.owner() == name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_owned()))
    }

    /// Every delivered message in delivery order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Running counters.
    pub const fn stats(&self) -> BusStats {
        self.stats
    }

    fn deliver(&mut self, receiver: &str, message: Message) -> Result<(), AgentError> {
        tracing::debug!(
            from = message.sender(),
            to = receiver,
            performative = %message.performative(),
            content = message.content(),
            "message delivered"
        );
        self.mailbox_mut(receiver)?.receive(message.clone());
        self.transcript.push(message);
        self.stats.delivered = self.stats.delivered.saturating_add(1);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RunScope
// ---------------------------------------------------------------------------

/// Lifecycle guard for one simulation run: hands out at most one bus.
#[derive(Debug, Default)]
pub struct RunScope {
    bus_active: bool,
}

impl RunScope {
    /// Start a new run with no bus yet.
    pub const fn new() -> Self {
        Self { bus_active: false }
    }

    /// Open the run's message bus.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::BusAlreadyActive`] if this run already has one.
    pub fn open_bus(&mut self, instant_delivery: bool) -> Result<MessageBus, AgentError> {
        if self.bus_active {
            return Err(AgentError::BusAlreadyActive);
        }
        self.bus_active = true;
        Ok(MessageBus::new(instant_delivery))
    }

    /// Whether a bus has been opened for this run.
    pub const fn bus_active(&self) -> bool {
        self.bus_active
    }
}

// ---------------------------------------------------------------------------
// Communicator
// ---------------------------------------------------------------------------

/// An agent's capability to talk over the bus under its own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communicator {
    name: String,
}

impl Communicator {
    /// Register `name` on the bus and return its communicator.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateName`] if the name is taken.
    pub fn register(name: impl Into<String>, bus: &mut MessageBus) -> Result<Self, AgentError> {
        let name = name.into();
        bus.register(&name)?;
        Ok(Self { name })
    }

    /// The agent name messages are sent under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send an act to one agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the receiver is unknown.
    pub fn send(&self, bus: &mut MessageBus, to: &str, act: &Act) -> Result<(), AgentError> {
        bus.send(Message::direct(self.name.as_str(), to, act))
    }

    /// Send an act to every other agent.
    ///
    /// # Errors
    ///
    /// Propagates bus routing errors.
    pub fn broadcast(&self, bus: &mut MessageBus, act: &Act) -> Result<(), AgentError> {
        bus.send(Message::broadcast(self.name.as_str(), act))
    }

    /// Drain this agent's unread messages.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the agent is not registered.
    pub fn unread(&self, bus: &mut MessageBus) -> Result<Vec<Message>, AgentError> {
        Ok(bus.mailbox_mut(&self.name)?.unread())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::Item;

    use super::*;

    fn engine() -> Item {
        Item::new("E", "A very quiet engine")
    }

    fn bus_with(names: &[&str], instant: bool) -> MessageBus {
        let mut bus = RunScope::new().open_bus(instant).unwrap();
        for name in names {
            bus.register(name).unwrap();
        }
        bus
    }

    #[test]
    fn second_bus_in_same_run_is_rejected() {
        let mut scope = RunScope::new();
        assert!(scope.open_bus(true).is_ok());
        assert!(matches!(scope.open_bus(true), Err(AgentError::BusAlreadyActive)));
        assert!(scope.bus_active());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut bus = bus_with(&["Alice"], true);
        let err = bus.register("Alice").unwrap_err();
        assert!(matches!(err, AgentError::DuplicateName(ref n) if n == "Alice"));
    }

    #[test]
    fn direct_message_reaches_only_receiver() {
        let mut bus = bus_with(&["Alice", "Bob"], true);
        bus.send(Message::direct("Alice", "Bob", &Act::Propose(engine())))
            .unwrap();
        assert_eq!(bus.mailbox("Bob").unwrap().len(), 1);
        assert!(bus.mailbox("Alice").unwrap().is_empty());
    }

    #[test]
    fn unknown_receiver_fails() {
        let mut bus = bus_with(&["Alice"], true);
        let err = bus
            .send(Message::direct("Alice", "Carol", &Act::Accept(engine())))
            .unwrap_err();
        assert!(matches!(err, AgentError::AgentNotFound(ref n) if n == "Carol"));
    }

    #[test]
    fn broadcast_skips_sender_and_addresses_each_copy() {
        let mut bus = bus_with(&["Alice", "Bob", "Carol"], true);
        bus.send(Message::broadcast("Alice", &Act::Commit(engine())))
            .unwrap();

        assert!(bus.mailbox("Alice").unwrap().is_empty());
        for name in ["Bob", "Carol"] {
            let mailbox = bus.mailbox(name).unwrap();
            assert_eq!(mailbox.len(), 1);
            assert_eq!(mailbox.all()[0].receiver(), Some(name));
        }
        assert_eq!(bus.transcript().len(), 2);
        assert_eq!(bus.stats().delivered, 2);
        assert_eq!(bus.stats().broadcasts, 1);
    }

    #[test]
    fn deferred_messages_wait_for_flush_in_order() {
        let mut bus = bus_with(&["Alice", "Bob"], false);
        bus.send(Message::direct("Alice", "Bob", &Act::Propose(engine())))
            .unwrap();
        bus.send(Message::direct("Alice", "Bob", &Act::Commit(engine())))
            .unwrap();
        assert!(bus.mailbox("Bob").unwrap().is_empty());
        assert_eq!(bus.pending_len(), 2);

        assert_eq!(bus.flush().unwrap(), 2);
        let performatives: Vec<Performative> = bus
            .mailbox("Bob")
            .unwrap()
            .all()
            .iter()
            .map(Message::performative)
            .collect();
        assert_eq!(performatives, vec![Performative::Propose, Performative::Commit]);

        assert_eq!(bus.flush().unwrap(), 0);
        assert_eq!(bus.mailbox("Bob").unwrap().len(), 2);
    }

    #[test]
    fn unread_returns_each_message_once() {
        let mut mailbox = Mailbox::new("Bob");
        mailbox.receive(Message::direct("Alice", "Bob", &Act::Propose(engine())));
        assert_eq!(mailbox.unread_count(), 1);
        assert_eq!(mailbox.unread().len(), 1);
        assert!(mailbox.unread().is_empty());

        mailbox.receive(Message::direct("Alice", "Bob", &Act::Commit(engine())));
        let fresh = mailbox.unread();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].performative(), Performative::Commit);
        assert_eq!(mailbox.all().len(), 2);
    }

    #[test]
    fn filtered_views_leave_cursor_alone() {
        let mut mailbox = Mailbox::new("Bob");
        mailbox.receive(Message::direct("Alice", "Bob", &Act::Propose(engine())));
        mailbox.receive(Message::direct("Carol", "Bob", &Act::AskWhy(engine())));

        assert_eq!(mailbox.by_performative(Performative::AskWhy).len(), 1);
        assert_eq!(mailbox.by_sender("Alice").len(), 1);
        assert!(mailbox.by_sender("Dave").is_empty());
        assert_eq!(mailbox.unread_count(), 2);
    }

    #[test]
    fn communicator_sends_under_its_name() {
        let mut bus = RunScope::new().open_bus(true).unwrap();
        let alice = Communicator::register("Alice", &mut bus).unwrap();
        let bob = Communicator::register("Bob", &mut bus).unwrap();

        alice.send(&mut bus, "Bob", &Act::Propose(engine())).unwrap();
        let inbox = bob.unread(&mut bus).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender(), "Alice");
        assert!(alice.unread(&mut bus).unwrap().is_empty());
    }
}
