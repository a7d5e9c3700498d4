//! Premises, arguments, and the argument text grammar.
//!
//! An [`Argument`] concludes that an item should (or should not) be
//! accepted, justified by [`Equality`] premises ("criterion has value") and
//! [`Comparison`] premises ("criterion A matters more than criterion B").
//! A premise only means something relative to one agent's preferences.
//!
//! # Grammar
//!
//! ```text
//! argument := ["not"] ITEM "<-" premise {"," premise}
//! premise  := CRITERION "=" VALUE | CRITERION ">" CRITERION
//! ```
//!
//! Rendering puts equalities before comparisons, joined by `", "`.
//! [`Argument::parse`] is the exact inverse of rendering for any item name
//! that contains neither `,` nor `<-`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::{Criterion, Value};
use crate::error::ArgumentParseError;
use crate::item::{Item, ItemCatalog};

/// Separator between the conclusion and the premises.
const CONCLUSION_SEPARATOR: &str = "<-";

/// Keyword prefixed to the conclusion when the decision is negative.
const NEGATION: &str = "not";

// ---------------------------------------------------------------------------
// Premises
// ---------------------------------------------------------------------------

/// Premise stating the value of a criterion for the argued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Equality {
    /// The criterion being valued.
    pub criterion: Criterion,
    /// The value asserted for it.
    pub value: Value,
}

impl Equality {
    /// Create a new equality premise.
    pub const fn new(criterion: Criterion, value: Value) -> Self {
        Self { criterion, value }
    }
}

impl fmt::Display for Equality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.criterion, self.value)
    }
}

/// Premise stating that one criterion outranks another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Comparison {
    /// The more important criterion.
    pub better: Criterion,
    /// The less important criterion.
    pub worse: Criterion,
}

impl Comparison {
    /// Create a new comparison premise.
    pub const fn new(better: Criterion, worse: Criterion) -> Self {
        Self { better, worse }
    }

    /// The same comparison with the two criteria swapped.
    pub const fn reversed(self) -> Self {
        Self {
            better: self.worse,
            worse: self.better,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.better, self.worse)
    }
}

// ---------------------------------------------------------------------------
// Argument
// ---------------------------------------------------------------------------

/// A justified conclusion about one item.
///
/// Arguments compare structurally: two arguments are equal when item,
/// decision, and both premise lists (in order) are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Argument {
    /// The item the argument is about.
    pub item: Item,
    /// `true` if the item should be accepted.
    pub decision: bool,
    /// Comparison premises, in order.
    pub comparisons: Vec<Comparison>,
    /// Equality premises, in order.
    pub equalities: Vec<Equality>,
}

impl Argument {
    /// Create an argument with no premises.
    pub const fn new(item: Item, decision: bool) -> Self {
        Self {
            item,
            decision,
            comparisons: Vec::new(),
            equalities: Vec::new(),
        }
    }

    /// Append an equality premise.
    #[must_use]
    pub fn with_equality(mut self, equality: Equality) -> Self {
        self.equalities.push(equality);
        self
    }

    /// Append a comparison premise.
    #[must_use]
    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparisons.push(comparison);
        self
    }

    /// Append an equality premise in place.
    pub fn add_premise_equality(&mut self, criterion: Criterion, value: Value) {
        self.equalities.push(Equality::new(criterion, value));
    }

    /// Append a comparison premise in place.
    pub fn add_premise_comparison(&mut self, better: Criterion, worse: Criterion) {
        self.comparisons.push(Comparison::new(better, worse));
    }

    /// The first equality premise: the criterion the argument leads with.
    pub fn leading_equality(&self) -> Option<&Equality> {
        self.equalities.first()
    }

    /// Parse the textual form of an argument, resolving the item against
    /// `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an [`ArgumentParseError`] naming the offending conclusion or
    /// premise if the text does not follow the grammar, mentions an unknown
    /// criterion or value, or names an item missing from the catalog.
    pub fn parse(raw: &str, catalog: &ItemCatalog) -> Result<Self, ArgumentParseError> {
        let (raw_conclusion, raw_premises) = raw.split_once(CONCLUSION_SEPARATOR).ok_or_else(|| {
            ArgumentParseError::MissingSeparator {
                raw: raw.to_owned(),
            }
        })?;

        let (item, decision) = parse_conclusion(raw_conclusion, raw, catalog)?;
        let mut argument = Self::new(item.clone(), decision);

        if raw_premises.trim().is_empty() {
            return Ok(argument);
        }

        for premise in raw_premises.split(',') {
            let invalid = || ArgumentParseError::InvalidPremise {
                premise: premise.trim().to_owned(),
                raw: raw.to_owned(),
            };

            if let Some((name, value)) = premise.split_once('=') {
                let criterion = name.parse::<Criterion>().ok().ok_or_else(invalid)?;
                let value = value.parse::<Value>().ok().ok_or_else(invalid)?;
                argument.add_premise_equality(criterion, value);
            } else if let Some((better, worse)) = premise.split_once('>') {
                let better = better.parse::<Criterion>().ok().ok_or_else(invalid)?;
                let worse = worse.parse::<Criterion>().ok().ok_or_else(invalid)?;
                argument.add_premise_comparison(better, worse);
            } else {
                return Err(invalid());
            }
        }

        Ok(argument)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decision {
            write!(f, "{NEGATION} ")?;
        }
        write!(f, "{} {CONCLUSION_SEPARATOR} ", self.item.name())?;

        let premises = self
            .equalities
            .iter()
            .map(ToString::to_string)
            .chain(self.comparisons.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&premises)
    }
}

/// Parse `ITEM` or `not ITEM` into the item and its decision.
fn parse_conclusion<'c>(
    conclusion: &str,
    raw: &str,
    catalog: &'c ItemCatalog,
) -> Result<(&'c Item, bool), ArgumentParseError> {
    let trimmed = conclusion.trim();
    if trimmed.is_empty() {
        return Err(ArgumentParseError::InvalidConclusion {
            conclusion: trimmed.to_owned(),
            raw: raw.to_owned(),
        });
    }

    if let Some(rest) = strip_negation(trimmed)
        && let Some(item) = catalog.get(rest)
    {
        return Ok((item, false));
    }

    if let Some(item) = catalog.get(trimmed) {
        return Ok((item, true));
    }

    Err(ArgumentParseError::UnknownItem {
        name: strip_negation(trimmed).unwrap_or(trimmed).to_owned(),
    })
}

/// Strip a leading case-insensitive `not` keyword followed by whitespace.
fn strip_negation(conclusion: &str) -> Option<&str> {
    let (head, rest) = conclusion.split_once(char::is_whitespace)?;
    head.eq_ignore_ascii_case(NEGATION)
        .then_some(rest.trim())
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        [
            Item::new("Diesel Engine", "A super cool diesel engine"),
            Item::new("E", "A very quiet engine"),
        ]
        .into_iter()
        .collect()
    }

    fn diesel() -> Item {
        Item::new("Diesel Engine", "A super cool diesel engine")
    }

    #[test]
    fn renders_equalities_before_comparisons() {
        let argument = Argument::new(diesel(), false)
            .with_comparison(Comparison::new(Criterion::Consumption, Criterion::Durability))
            .with_equality(Equality::new(Criterion::Durability, Value::Good));
        assert_eq!(
            argument.to_string(),
            "not Diesel Engine <- DURABILITY=GOOD, CONSUMPTION>DURABILITY"
        );
    }

    #[test]
    fn parse_inverts_render() {
        let argument = Argument::new(diesel(), false)
            .with_comparison(Comparison::new(Criterion::Consumption, Criterion::Durability))
            .with_comparison(Comparison::new(
                Criterion::EnvironmentImpact,
                Criterion::ProductionCost,
            ))
            .with_equality(Equality::new(Criterion::Durability, Value::Good));
        let parsed = Argument::parse(&argument.to_string(), &catalog()).unwrap();
        assert_eq!(parsed, argument);
    }

    #[test]
    fn positive_argument_has_no_prefix() {
        let argument =
            Argument::new(diesel(), true).with_equality(Equality::new(Criterion::Noise, Value::VeryGood));
        let text = argument.to_string();
        assert_eq!(text, "Diesel Engine <- NOISE=VERY_GOOD");
        assert!(Argument::parse(&text, &catalog()).unwrap().decision);
    }

    #[test]
    fn argument_without_premises_round_trips() {
        let argument = Argument::new(diesel(), true);
        let parsed = Argument::parse(&argument.to_string(), &catalog()).unwrap();
        assert_eq!(parsed, argument);
    }

    #[test]
    fn unknown_criterion_names_the_premise() {
        let err = Argument::parse("E <- PRICE=GOOD", &catalog()).unwrap_err();
        assert_eq!(
            err,
            ArgumentParseError::InvalidPremise {
                premise: String::from("PRICE=GOOD"),
                raw: String::from("E <- PRICE=GOOD"),
            }
        );
    }

    #[test]
    fn unknown_value_names_the_premise() {
        let err = Argument::parse("E <- NOISE=LOUD", &catalog()).unwrap_err();
        assert!(matches!(err, ArgumentParseError::InvalidPremise { ref premise, .. } if premise == "NOISE=LOUD"));
    }

    #[test]
    fn premise_without_operator_is_rejected() {
        let err = Argument::parse("E <- NOISE", &catalog()).unwrap_err();
        assert!(matches!(err, ArgumentParseError::InvalidPremise { .. }));
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = Argument::parse("E NOISE=GOOD", &catalog()).unwrap_err();
        assert!(matches!(err, ArgumentParseError::MissingSeparator { .. }));
    }

    #[test]
    fn empty_conclusion_is_rejected() {
        let err = Argument::parse(" <- NOISE=GOOD", &catalog()).unwrap_err();
        assert!(matches!(err, ArgumentParseError::InvalidConclusion { .. }));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let err = Argument::parse("not Turbine <- NOISE=GOOD", &catalog()).unwrap_err();
        assert_eq!(
            err,
            ArgumentParseError::UnknownItem {
                name: String::from("Turbine")
            }
        );
    }

    #[test]
    fn negation_keyword_is_case_insensitive() {
        let parsed = Argument::parse("NOT E <- NOISE=BAD", &catalog()).unwrap();
        assert!(!parsed.decision);
        assert_eq!(parsed.item.name(), "E");
    }

    #[test]
    fn reversed_comparison_swaps_criteria() {
        let comparison = Comparison::new(Criterion::Noise, Criterion::Durability);
        assert_eq!(
            comparison.reversed(),
            Comparison::new(Criterion::Durability, Criterion::Noise)
        );
    }
}
