//! Premise derivation and rebuttal construction.
//!
//! Premises are read off one agent's [`Preferences`]: a criterion whose
//! value for the item is on the supporting side (good or better) yields a
//! supporting [`Equality`], one on the attacking side (bad or worse) an
//! attacking one. Both lists follow the agent's criterion ranking, most
//! important first; [`build_attack`] relies on that order for its prefix
//! scan.

use parley_types::{Argument, Comparison, Equality, Item};

use crate::error::AgentError;
use crate::preferences::Preferences;

/// Equalities in favour of `item`, most important criterion first.
///
/// # Errors
///
/// Returns [`AgentError::ValueNotFound`] if the table is incomplete.
pub fn supporting_premises(item: &Item, prefs: &Preferences) -> Result<Vec<Equality>, AgentError> {
    premises_where(item, prefs, |e| e.value.is_supporting())
}

/// Equalities against `item`, most important criterion first.
///
/// # Errors
///
/// Returns [`AgentError::ValueNotFound`] if the table is incomplete.
pub fn attacking_premises(item: &Item, prefs: &Preferences) -> Result<Vec<Equality>, AgentError> {
    premises_where(item, prefs, |e| e.value.is_attacking())
}

fn premises_where(
    item: &Item,
    prefs: &Preferences,
    keep: impl Fn(&Equality) -> bool,
) -> Result<Vec<Equality>, AgentError> {
    let mut premises = Vec::new();
    for &criterion in prefs.ranking() {
        let equality = Equality::new(criterion, prefs.value(item, criterion)?);
        if keep(&equality) {
            premises.push(equality);
        }
    }
    Ok(premises)
}

/// Candidate counterarguments to `argument` under the responder's `prefs`.
///
/// Every candidate concludes the opposite decision about the same item.
/// Three families are generated in this order:
///
/// 1. Ranking inversion: for each comparison `A>B` in the argument that the
///    responder ranks the other way round, claim `B>A` together with the
///    responder's own value for `B`.
/// 2. Direct contradiction: if the responder's value for the argument's
///    leading criterion lies on the opposite side of the midpoint from the
///    argued value, state the responder's value.
/// 3. Ranking priority: for each premise of the opposite polarity whose
///    criterion outranks the leading criterion, claim that it outranks it,
///    with the premise itself. The scan stops at the first premise that
///    does not outrank it.
///
/// The combined list is then reversed, so the last ranking-priority
/// rebuttal is tried first.
///
/// # Errors
///
/// Returns [`AgentError::ValueNotFound`] if the table is incomplete.
pub fn build_attack(argument: &Argument, prefs: &Preferences) -> Result<Vec<Argument>, AgentError> {
    let item = &argument.item;
    let opposite = !argument.decision;
    let pool = if argument.decision {
        attacking_premises(item, prefs)?
    } else {
        supporting_premises(item, prefs)?
    };

    let mut attacks = Vec::new();

    for comparison in &argument.comparisons {
        if prefs.is_preferred_criterion(comparison.worse, comparison.better) {
            let own = prefs.value(item, comparison.worse)?;
            attacks.push(
                Argument::new(item.clone(), opposite)
                    .with_comparison(comparison.reversed())
                    .with_equality(Equality::new(comparison.worse, own)),
            );
        }
    }

    if let Some(lead) = argument.leading_equality() {
        let own = prefs.value(item, lead.criterion)?;
        if own.opposes(lead.value) {
            attacks.push(
                Argument::new(item.clone(), opposite)
                    .with_equality(Equality::new(lead.criterion, own)),
            );
        }

        for premise in pool
            .iter()
            .take_while(|p| prefs.is_preferred_criterion(p.criterion, lead.criterion))
        {
            attacks.push(
                Argument::new(item.clone(), opposite)
                    .with_comparison(Comparison::new(premise.criterion, lead.criterion))
                    .with_equality(*premise),
            );
        }
    }

    attacks.reverse();
    Ok(attacks)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::{Criterion, Value};

    use super::*;

    fn diesel() -> Item {
        Item::new("ICED", "A super cool diesel engine")
    }

    fn electric() -> Item {
        Item::new("E", "A very quiet engine")
    }

    /// Ranking: `PRODUCTION_COST` > `ENVIRONMENT_IMPACT` > `CONSUMPTION` >
    /// `DURABILITY` > `NOISE`.
    fn prefs() -> Preferences {
        let mut prefs = Preferences::new(vec![
            Criterion::ProductionCost,
            Criterion::EnvironmentImpact,
            Criterion::Consumption,
            Criterion::Durability,
            Criterion::Noise,
        ])
        .unwrap();
        let rows = [
            (diesel(), [Value::VeryGood, Value::VeryBad, Value::Good, Value::VeryGood, Value::VeryBad]),
            (electric(), [Value::Bad, Value::VeryGood, Value::VeryBad, Value::Good, Value::VeryGood]),
        ];
        for (item, values) in rows {
            for (criterion, value) in [
                Criterion::ProductionCost,
                Criterion::EnvironmentImpact,
                Criterion::Consumption,
                Criterion::Durability,
                Criterion::Noise,
            ]
            .into_iter()
            .zip(values)
            {
                prefs.set_value(&item, criterion, value);
            }
        }
        prefs
    }

    #[test]
    fn premises_follow_ranking_order() {
        let prefs = prefs();
        assert_eq!(
            supporting_premises(&diesel(), &prefs).unwrap(),
            vec![
                Equality::new(Criterion::ProductionCost, Value::VeryGood),
                Equality::new(Criterion::Consumption, Value::Good),
                Equality::new(Criterion::Durability, Value::VeryGood),
            ]
        );
        assert_eq!(
            attacking_premises(&diesel(), &prefs).unwrap(),
            vec![
                Equality::new(Criterion::EnvironmentImpact, Value::VeryBad),
                Equality::new(Criterion::Noise, Value::VeryBad),
            ]
        );
    }

    #[test]
    fn neutral_values_are_neither_supporting_nor_attacking() {
        let mut prefs = Preferences::new(Criterion::ALL.to_vec()).unwrap();
        for criterion in Criterion::ALL {
            prefs.set_value(&diesel(), criterion, Value::Average);
        }
        assert!(supporting_premises(&diesel(), &prefs).unwrap().is_empty());
        assert!(attacking_premises(&diesel(), &prefs).unwrap().is_empty());
    }

    #[test]
    fn priority_rebuttal_uses_more_important_attacking_premise() {
        let argument = Argument::new(electric(), true)
            .with_equality(Equality::new(Criterion::EnvironmentImpact, Value::VeryGood));
        let attacks = build_attack(&argument, &prefs()).unwrap();
        assert_eq!(
            attacks,
            vec![
                Argument::new(electric(), false)
                    .with_comparison(Comparison::new(
                        Criterion::ProductionCost,
                        Criterion::EnvironmentImpact
                    ))
                    .with_equality(Equality::new(Criterion::ProductionCost, Value::Bad)),
            ]
        );
    }

    #[test]
    fn contradiction_comes_after_priority_rebuttals() {
        let argument = Argument::new(diesel(), true)
            .with_equality(Equality::new(Criterion::Noise, Value::VeryGood));
        let attacks = build_attack(&argument, &prefs()).unwrap();
        assert_eq!(attacks.len(), 2);
        assert_eq!(
            attacks[0].to_string(),
            "not ICED <- ENVIRONMENT_IMPACT=VERY_BAD, ENVIRONMENT_IMPACT>NOISE"
        );
        assert_eq!(attacks[1].to_string(), "not ICED <- NOISE=VERY_BAD");
    }

    #[test]
    fn misstated_comparison_is_inverted() {
        let argument = Argument::new(diesel(), true)
            .with_comparison(Comparison::new(Criterion::Noise, Criterion::ProductionCost))
            .with_equality(Equality::new(Criterion::ProductionCost, Value::VeryGood));
        let attacks = build_attack(&argument, &prefs()).unwrap();
        assert_eq!(
            attacks,
            vec![
                Argument::new(diesel(), false)
                    .with_comparison(Comparison::new(Criterion::ProductionCost, Criterion::Noise))
                    .with_equality(Equality::new(Criterion::ProductionCost, Value::VeryGood)),
            ]
        );
    }

    #[test]
    fn rejection_is_attacked_with_supporting_premises() {
        let argument = Argument::new(diesel(), false)
            .with_equality(Equality::new(Criterion::Durability, Value::Bad));
        let attacks = build_attack(&argument, &prefs()).unwrap();
        assert!(attacks.iter().all(|a| a.decision));
        // PRODUCTION_COST and CONSUMPTION outrank DURABILITY; the scan stops at DURABILITY.
        assert_eq!(attacks.len(), 3);
        assert_eq!(
            attacks[0].to_string(),
            "ICED <- CONSUMPTION=GOOD, CONSUMPTION>DURABILITY"
        );
        assert_eq!(
            attacks[1].to_string(),
            "ICED <- PRODUCTION_COST=VERY_GOOD, PRODUCTION_COST>DURABILITY"
        );
        assert_eq!(attacks[2].to_string(), "ICED <- DURABILITY=VERY_GOOD");
    }

    #[test]
    fn argument_without_premises_has_no_rebuttal() {
        let argument = Argument::new(diesel(), true);
        assert!(build_attack(&argument, &prefs()).unwrap().is_empty());
    }
}
