//! Enumeration types for the Parley negotiation simulation.
//!
//! Criteria, ordinal values, and performatives form closed sets. Each has a
//! canonical upper-snake wire token used by the argument grammar and the
//! preference tables; [`FromStr`] is the exact inverse of [`fmt::Display`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentParseError;

// ---------------------------------------------------------------------------
// Criterion
// ---------------------------------------------------------------------------

/// A decision criterion an agent weighs when judging an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Criterion {
    /// Cost of producing the item.
    ProductionCost,
    /// Running consumption (fuel, energy).
    Consumption,
    /// Expected lifetime of the item.
    Durability,
    /// Impact on the environment.
    EnvironmentImpact,
    /// Noise produced while operating.
    Noise,
}

impl Criterion {
    /// Every criterion, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::ProductionCost,
        Self::Consumption,
        Self::Durability,
        Self::EnvironmentImpact,
        Self::Noise,
    ];

    /// The wire token for this criterion.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductionCost => "PRODUCTION_COST",
            Self::Consumption => "CONSUMPTION",
            Self::Durability => "DURABILITY",
            Self::EnvironmentImpact => "ENVIRONMENT_IMPACT",
            Self::Noise => "NOISE",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ArgumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == token)
            .ok_or_else(|| ArgumentParseError::UnknownCriterion {
                token: token.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Which side of the neutral midpoint a [`Value`] sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// `GOOD` or `VERY_GOOD`: usable to support an item.
    Supporting,
    /// `BAD` or `VERY_BAD`: usable to attack an item.
    Attacking,
    /// `AVERAGE`: neither.
    Neutral,
}

/// Five-level ordinal scale an agent assigns to each (item, criterion) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Value {
    /// Ordinal 0.
    VeryBad,
    /// Ordinal 1.
    Bad,
    /// Ordinal 2, the neutral midpoint.
    Average,
    /// Ordinal 3.
    Good,
    /// Ordinal 4.
    VeryGood,
}

impl Value {
    /// Every value, worst first.
    pub const ALL: [Self; 5] = [
        Self::VeryBad,
        Self::Bad,
        Self::Average,
        Self::Good,
        Self::VeryGood,
    ];

    /// The ordinal level of this value (0 through 4).
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::VeryBad => 0,
            Self::Bad => 1,
            Self::Average => 2,
            Self::Good => 3,
            Self::VeryGood => 4,
        }
    }

    /// Classify this value relative to the neutral midpoint.
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Good | Self::VeryGood => Polarity::Supporting,
            Self::VeryBad | Self::Bad => Polarity::Attacking,
            Self::Average => Polarity::Neutral,
        }
    }

    /// Whether this value is `GOOD` or better.
    pub const fn is_supporting(self) -> bool {
        matches!(self.polarity(), Polarity::Supporting)
    }

    /// Whether this value is `BAD` or worse.
    pub const fn is_attacking(self) -> bool {
        matches!(self.polarity(), Polarity::Attacking)
    }

    /// Whether `self` and `other` lie strictly on opposite sides of the
    /// neutral midpoint (one supporting, the other attacking).
    pub const fn opposes(self, other: Self) -> bool {
        matches!(
            (self.polarity(), other.polarity()),
            (Polarity::Supporting, Polarity::Attacking)
                | (Polarity::Attacking, Polarity::Supporting)
        )
    }

    /// The wire token for this value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryBad => "VERY_BAD",
            Self::Bad => "BAD",
            Self::Average => "AVERAGE",
            Self::Good => "GOOD",
            Self::VeryGood => "VERY_GOOD",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Value {
    type Err = ArgumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == token)
            .ok_or_else(|| ArgumentParseError::UnknownValue {
                token: token.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Performative
// ---------------------------------------------------------------------------

/// The speech-act tag of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Performative {
    /// Offer an item for agreement.
    Propose,
    /// Agree to a proposed item.
    Accept,
    /// Request the justification for a proposal.
    AskWhy,
    /// Send an argument for or against an item.
    Argue,
    /// Declare irrevocable agreement on an item.
    Commit,
}

impl Performative {
    /// The wire token for this performative.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Propose => "PROPOSE",
            Self::Accept => "ACCEPT",
            Self::AskWhy => "ASK_WHY",
            Self::Argue => "ARGUE",
            Self::Commit => "COMMIT",
        }
    }
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
