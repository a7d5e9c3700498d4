//! Wire messages and the typed speech acts they carry.
//!
//! A [`Message`] is the wire shape exchanged through the bus: sender,
//! optional receiver (absent means broadcast), performative, and a string
//! content. An [`Act`] is the typed view of the same message, with the
//! payload each performative requires. Agents build messages from acts and
//! decode received messages back into acts against their item catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::argument::Argument;
use crate::enums::Performative;
use crate::error::ArgumentParseError;
use crate::item::{Item, ItemCatalog};

// ---------------------------------------------------------------------------
// Act
// ---------------------------------------------------------------------------

/// A speech act with its performative-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Act {
    /// Offer an item.
    Propose(Item),
    /// Agree to an item.
    Accept(Item),
    /// Ask for the justification of a proposal.
    AskWhy(Item),
    /// Argue for or against an item.
    Argue(Argument),
    /// Commit to an item.
    Commit(Item),
}

impl Act {
    /// The performative tag of this act.
    pub const fn performative(&self) -> Performative {
        match self {
            Self::Propose(_) => Performative::Propose,
            Self::Accept(_) => Performative::Accept,
            Self::AskWhy(_) => Performative::AskWhy,
            Self::Argue(_) => Performative::Argue,
            Self::Commit(_) => Performative::Commit,
        }
    }

    /// The wire content: an item name, or a rendered argument.
    pub fn content(&self) -> String {
        match self {
            Self::Propose(item) | Self::Accept(item) | Self::AskWhy(item) | Self::Commit(item) => {
                item.name().to_owned()
            }
            Self::Argue(argument) => argument.to_string(),
        }
    }

    /// The item this act is about.
    pub const fn item(&self) -> &Item {
        match self {
            Self::Propose(item) | Self::Accept(item) | Self::AskWhy(item) | Self::Commit(item) => {
                item
            }
            Self::Argue(argument) => &argument.item,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A message routed between agents. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    from: String,
    to: Option<String>,
    performative: Performative,
    content: String,
}

impl Message {
    /// Build a raw message. Prefer [`Message::direct`] and
    /// [`Message::broadcast`] when a typed [`Act`] is at hand.
    pub fn new(
        from: impl Into<String>,
        to: Option<String>,
        performative: Performative,
        content: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to,
            performative,
            content: content.into(),
        }
    }

    /// A message addressed to a single agent.
    pub fn direct(from: impl Into<String>, to: impl Into<String>, act: &Act) -> Self {
        Self::new(from, Some(to.into()), act.performative(), act.content())
    }

    /// A message addressed to every other registered agent.
    pub fn broadcast(from: impl Into<String>, act: &Act) -> Self {
        Self::new(from, None, act.performative(), act.content())
    }

    /// A copy of this message addressed to `receiver`.
    #[must_use]
    pub fn readdressed(&self, receiver: &str) -> Self {
        Self {
            from: self.from.clone(),
            to: Some(receiver.to_owned()),
            performative: self.performative,
            content: self.content.clone(),
        }
    }

    /// The sender's name.
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// The receiver's name, or `None` for a broadcast.
    pub fn receiver(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// Whether this message has no specific receiver.
    pub const fn is_broadcast(&self) -> bool {
        self.to.is_none()
    }

    /// The performative tag.
    pub const fn performative(&self) -> Performative {
        self.performative
    }

    /// The raw content string.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Decode the content into a typed [`Act`].
    ///
    /// # Errors
    ///
    /// Returns an [`ArgumentParseError`] if the content names an item
    /// missing from `catalog` or, for `ARGUE`, is not a valid argument.
    pub fn decode(&self, catalog: &ItemCatalog) -> Result<Act, ArgumentParseError> {
        let item = || catalog.resolve(&self.content).cloned();
        match self.performative {
            Performative::Propose => item().map(Act::Propose),
            Performative::Accept => item().map(Act::Accept),
            Performative::AskWhy => item().map(Act::AskWhy),
            Performative::Argue => Argument::parse(&self.content, catalog).map(Act::Argue),
            Performative::Commit => item().map(Act::Commit),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to = self.to.as_deref().unwrap_or("*");
        write!(
            f,
            "From {} to {} ({}) {}",
            self.from, to, self.performative, self.content
        )
    }
}
