//! The dialectical stack and the rebuttal search over it.
//!
//! A dispute about one item is tracked as a stack of frames. Each frame
//! ([`ExtendedArgument`]) holds a claim and the counterarguments still
//! available against it. When an argument arrives, [`Dialogue::process_argument`]
//! pushes a frame for it and walks the stack looking for a counterargument
//! that has not been used yet in this dialogue.
//!
//! Two claims about the same item and criterion, with opposite decisions and
//! values on opposite sides of the midpoint, cancel each other out: both
//! frames are popped.
//!
//! Every argument is sent at most once per dialogue (the used set), and the
//! number of distinct arguments is bounded, so the walk always terminates.

use std::collections::{BTreeSet, VecDeque};

use parley_types::{Argument, Item};
use rust_decimal::Decimal;

use crate::argumentation::build_attack;
use crate::error::AgentError;
use crate::preferences::Preferences;

// ---------------------------------------------------------------------------
// ExtendedArgument
// ---------------------------------------------------------------------------

/// A claim with the counterarguments not yet tried against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedArgument {
    claim: Argument,
    counters: VecDeque<Argument>,
}

impl ExtendedArgument {
    /// Create a frame trying `counters` in order.
    pub fn new(claim: Argument, counters: impl IntoIterator<Item = Argument>) -> Self {
        Self {
            claim,
            counters: counters.into_iter().collect(),
        }
    }

    /// A frame with nothing left to try.
    pub const fn leaf(claim: Argument) -> Self {
        Self {
            claim,
            counters: VecDeque::new(),
        }
    }

    /// The claim this frame holds.
    pub const fn claim(&self) -> &Argument {
        &self.claim
    }

    /// Counterarguments not yet tried.
    pub fn remaining(&self) -> usize {
        self.counters.len()
    }

    /// Take the next counterargument to try.
    pub fn next_counter(&mut self) -> Option<Argument> {
        self.counters.pop_front()
    }
}

/// Whether two claims neutralize each other.
///
/// They must concern the same item with opposite decisions, and lead with
/// equalities on the same criterion whose values lie on opposite sides of
/// the midpoint.
pub fn cancels(a: &Argument, b: &Argument) -> bool {
    if a.item != b.item || a.decision == b.decision {
        return false;
    }
    match (a.leading_equality(), b.leading_equality()) {
        (Some(x), Some(y)) => x.criterion == y.criterion && x.value.opposes(y.value),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// DialecticalStack
// ---------------------------------------------------------------------------

/// Ordered stack of frames; the last element is the top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialecticalStack {
    frames: Vec<ExtendedArgument>,
}

impl DialecticalStack {
    /// Create an empty stack.
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Push a frame on top.
    pub fn push(&mut self, frame: ExtendedArgument) {
        self.frames.push(frame);
    }

    /// Remove and return the top frame.
    pub fn pop(&mut self) -> Option<ExtendedArgument> {
        self.frames.pop()
    }

    /// The top frame.
    pub fn peek(&self) -> Option<&ExtendedArgument> {
        self.frames.last()
    }

    /// Mutable access to the top frame.
    pub fn peek_mut(&mut self) -> Option<&mut ExtendedArgument> {
        self.frames.last_mut()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame is stacked.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Whether any stacked frame holds `claim`.
    pub fn contains_claim(&self, claim: &Argument) -> bool {
        self.frames.iter().any(|f| f.claim() == claim)
    }

    /// Whether the two topmost claims cancel each other.
    pub fn top_two_cancel(&self) -> bool {
        match self.frames.as_slice() {
            [.., below, top] => cancels(below.claim(), top.claim()),
            _ => false,
        }
    }

    /// Pop the two topmost frames if they cancel. Returns whether they did.
    pub fn pop_cancelled(&mut self) -> bool {
        if !self.top_two_cancel() {
            return false;
        }
        self.frames.pop();
        self.frames.pop();
        true
    }
}

// ---------------------------------------------------------------------------
// Dialogue
// ---------------------------------------------------------------------------

/// One agent's dispute state for the item currently being argued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialogue {
    item: Option<Item>,
    stack: DialecticalStack,
    used: BTreeSet<Argument>,
}

impl Dialogue {
    /// Create an empty dialogue.
    pub const fn new() -> Self {
        Self {
            item: None,
            stack: DialecticalStack::new(),
            used: BTreeSet::new(),
        }
    }

    /// The item under dispute, if any.
    pub const fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    /// The current stack.
    pub const fn stack(&self) -> &DialecticalStack {
        &self.stack
    }

    /// Whether `argument` was already sent in this dialogue.
    pub fn is_used(&self, argument: &Argument) -> bool {
        self.used.contains(argument)
    }

    /// Record `argument` as sent. Returns `false` if it already was.
    pub fn mark_used(&mut self, argument: &Argument) -> bool {
        self.used.insert(argument.clone())
    }

    /// Start a fresh dialogue when the disputed item changes.
    pub fn reset_for(&mut self, item: &Item) {
        if self.item.as_ref() != Some(item) {
            self.item = Some(item.clone());
            self.stack.clear();
            self.used.clear();
        }
    }

    /// Push a frame for `claim` whose counters are `counters`, minus any
    /// argument already held as a claim on the stack.
    pub fn push_claim(&mut self, claim: Argument, counters: Vec<Argument>) {
        let counters: Vec<Argument> = counters
            .into_iter()
            .filter(|c| !self.stack.contains_claim(c))
            .collect();
        self.stack.push(ExtendedArgument::new(claim, counters));
    }

    /// Find a rebuttal to `argument`, or `None` if it must stand.
    ///
    /// `pool` and `top_fraction` drive the responder's own judgement of the
    /// item: if being in the top fraction of `pool` already agrees with the
    /// argument's decision, there is nothing to dispute.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if the preference table is
    /// incomplete for the argued item or the pool.
    pub fn process_argument(
        &mut self,
        argument: &Argument,
        prefs: &Preferences,
        pool: &[Item],
        top_fraction: Decimal,
    ) -> Result<Option<Argument>, AgentError> {
        self.reset_for(&argument.item);

        if prefs.is_top_fraction(&argument.item, pool, top_fraction)? == argument.decision {
            tracing::debug!(argument = %argument, "argument agrees with own judgement");
            return Ok(None);
        }

        let counters = build_attack(argument, prefs)?;
        self.push_claim(argument.clone(), counters);

        while !self.stack.is_empty() {
            if self.stack.pop_cancelled() {
                continue;
            }

            if let Some(rebuttal) = self.next_unused_counter() {
                self.stack.push(ExtendedArgument::leaf(rebuttal.clone()));
                self.stack.pop_cancelled();
                tracing::debug!(rebuttal = %rebuttal, depth = self.stack.len(), "rebuttal found");
                return Ok(Some(rebuttal));
            }

            if self.stack.len() < 2 {
                break;
            }
            self.stack.pop();
            self.stack.pop();
        }

        self.stack.clear();
        tracing::debug!(argument = %argument, "no rebuttal left");
        Ok(None)
    }

    /// Pop counters off the top frame until one has not been used yet.
    fn next_unused_counter(&mut self) -> Option<Argument> {
        let top = self.stack.peek_mut()?;
        while let Some(candidate) = top.next_counter() {
            if self.used.insert(candidate.clone()) {
                return Some(candidate);
            }
        }
        None
    }
}
