//! Agent preferences: criterion ranking, value table, and item scoring.
//!
//! Each agent privately holds a strict ranking of all [`Criterion`]s (most
//! important first) and a [`Value`] for every (item, criterion) pair it may
//! reason about. Missing values are data-integrity faults, never recoverable.
//!
//! # Scoring
//!
//! An item's score is a weighted sum over the ranking. The most important
//! criterion weighs 100 and each following rank halves the weight
//! (100, 50, 25, 12.5, 6.25); each term is the weight times the value's
//! ordinal (0--4). Scores are exact [`Decimal`]s so maximum-score ties are
//! detected without floating-point error.
//!
//! # Preference files
//!
//! [`Preferences::load`] reads two comma-separated tables from a directory:
//!
//! - `criteria.csv` with columns `criterion_name,rank` (rank 0 = most important)
//! - `values.csv` with columns `item,criterion_name,value`
//!
//! Items that appear in `values.csv` but not in the catalog are added to it
//! with a placeholder description.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parley_types::{Criterion, Item, ItemCatalog, Value};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::AgentError;

/// Weight of the most important criterion.
const TOP_CRITERION_WEIGHT: Decimal = Decimal::ONE_HUNDRED;

/// Description given to items first seen in a values table.
const DISCOVERED_ITEM_DESCRIPTION: &str = "No description.";

/// File name of the criterion ranking table.
pub const CRITERIA_FILE: &str = "criteria.csv";

/// File name of the (item, criterion) value table.
pub const VALUES_FILE: &str = "values.csv";

/// One agent's private preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Criteria ordered from most to least important.
    ranking: Vec<Criterion>,
    /// Value per (item name, criterion).
    values: BTreeMap<(String, Criterion), Value>,
}

impl Preferences {
    /// Create preferences with the given ranking and an empty value table.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRanking`] unless `ranking` lists every
    /// criterion exactly once.
    pub fn new(ranking: Vec<Criterion>) -> Result<Self, AgentError> {
        validate_ranking(&ranking)?;
        Ok(Self {
            ranking,
            values: BTreeMap::new(),
        })
    }

    /// Generate random preferences over every item in `catalog`.
    ///
    /// The ranking is a uniform shuffle of all criteria and every
    /// (item, criterion) pair receives a uniformly random value.
    pub fn generate_random<R: Rng + ?Sized>(catalog: &ItemCatalog, rng: &mut R) -> Self {
        let mut ranking = Criterion::ALL.to_vec();
        ranking.shuffle(rng);

        let mut values = BTreeMap::new();
        for item in catalog {
            for criterion in Criterion::ALL {
                let value = Value::ALL.choose(rng).copied().unwrap_or(Value::Average);
                values.insert((item.name().to_owned(), criterion), value);
            }
        }

        Self { ranking, values }
    }

    /// Load preferences from `criteria.csv` and `values.csv` in `dir`.
    ///
    /// Returns the preferences together with the items that were not yet in
    /// `catalog` (they are inserted into it). Existing items are never
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::PreferenceFile`] if a file cannot be read or a
    /// row is malformed, and [`AgentError::InvalidRanking`] if the criteria
    /// table is not a permutation of all criteria.
    pub fn load(dir: &Path, catalog: &mut ItemCatalog) -> Result<(Self, Vec<Item>), AgentError> {
        let ranking = read_criteria_csv(&dir.join(CRITERIA_FILE))?;
        let mut preferences = Self::new(ranking)?;
        let discovered = preferences.read_values_csv(&dir.join(VALUES_FILE), catalog)?;
        Ok((preferences, discovered))
    }

    /// Criteria from most to least important.
    pub fn ranking(&self) -> &[Criterion] {
        &self.ranking
    }

    /// Set the value of `criterion` for `item`, replacing any previous one.
    pub fn set_value(&mut self, item: &Item, criterion: Criterion, value: Value) {
        self.values.insert((item.name().to_owned(), criterion), value);
    }

    /// Look up the value of `criterion` for `item`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if the table has no entry.
    pub fn value(&self, item: &Item, criterion: Criterion) -> Result<Value, AgentError> {
        self.values
            .get(&(item.name().to_owned(), criterion))
            .copied()
            .ok_or_else(|| AgentError::ValueNotFound {
                item: item.name().to_owned(),
                criterion,
            })
    }

    /// Position of `criterion` in the ranking (0 = most important).
    pub fn rank_of(&self, criterion: Criterion) -> Option<usize> {
        self.ranking.iter().position(|c| *c == criterion)
    }

    /// Whether `better` is ranked strictly above `worse`.
    pub fn is_preferred_criterion(&self, better: Criterion, worse: Criterion) -> bool {
        match (self.rank_of(better), self.rank_of(worse)) {
            (Some(b), Some(w)) => b < w,
            _ => false,
        }
    }

    /// Weighted score of `item` under this ranking.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if any criterion has no value.
    pub fn score(&self, item: &Item) -> Result<Decimal, AgentError> {
        let mut weight = TOP_CRITERION_WEIGHT;
        let mut total = Decimal::ZERO;
        for &criterion in &self.ranking {
            let ordinal = Decimal::from(self.value(item, criterion)?.ordinal());
            total = total.saturating_add(weight.saturating_mul(ordinal));
            weight = weight.checked_div(Decimal::TWO).unwrap_or(Decimal::ZERO);
        }
        Ok(total)
    }

    /// Whether `first` scores strictly higher than `second`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if either item is incomplete.
    pub fn is_preferred_item(&self, first: &Item, second: &Item) -> Result<bool, AgentError> {
        Ok(self.score(first)? > self.score(second)?)
    }

    /// Pick the highest-scoring item, breaking ties uniformly at random.
    ///
    /// Returns `None` for an empty candidate list.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if any candidate is incomplete.
    pub fn most_preferred<'a, R: Rng + ?Sized>(
        &self,
        items: &'a [Item],
        rng: &mut R,
    ) -> Result<Option<&'a Item>, AgentError> {
        let scored = self.scored(items)?;
        let Some(best) = scored.iter().map(|(score, _)| *score).max() else {
            return Ok(None);
        };

        let tied: Vec<&Item> = scored
            .into_iter()
            .filter(|(score, _)| *score == best)
            .map(|(_, item)| item)
            .collect();
        Ok(tied.choose(rng).copied())
    }

    /// Whether `item` is among the first `ceil(fraction * items.len())`
    /// candidates once sorted by descending score.
    ///
    /// Ties keep the order of `items`: the sort is stable, so among equal
    /// scores the candidate listed first ranks higher.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ValueNotFound`] if any candidate is incomplete.
    pub fn is_top_fraction(
        &self,
        item: &Item,
        items: &[Item],
        fraction: Decimal,
    ) -> Result<bool, AgentError> {
        let mut scored = self.scored(items)?;
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let cutoff = top_fraction_len(items.len(), fraction);
        Ok(scored
            .iter()
            .take(cutoff)
            .any(|(_, candidate)| candidate.name() == item.name()))
    }

    /// Read `values.csv`, inserting unknown items into `catalog`.
    ///
    /// Returns the newly discovered items.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::PreferenceFile`] on I/O failure or a malformed row.
    pub fn read_values_csv(
        &mut self,
        path: &Path,
        catalog: &mut ItemCatalog,
    ) -> Result<Vec<Item>, AgentError> {
        let table = CsvTable::read(path, &["item", "criterion_name", "value"])?;
        let mut discovered = Vec::new();

        for row in &table.rows {
            let [item_name, criterion, value] = row.fields.as_slice() else {
                return Err(table.malformed(row.line, "expected 3 fields"));
            };
            let criterion = criterion
                .parse::<Criterion>()
                .map_err(|e| table.malformed(row.line, &e.to_string()))?;
            let value = value
                .parse::<Value>()
                .map_err(|e| table.malformed(row.line, &e.to_string()))?;

            if !catalog.contains(item_name) {
                let item = Item::new(item_name.clone(), DISCOVERED_ITEM_DESCRIPTION);
                catalog.insert(item.clone());
                discovered.push(item);
            }
            self.values.insert((item_name.clone(), criterion), value);
        }

        Ok(discovered)
    }

    /// Score every candidate, keeping candidate order.
    fn scored<'a>(&self, items: &'a [Item]) -> Result<Vec<(Decimal, &'a Item)>, AgentError> {
        items
            .iter()
            .map(|item| Ok((self.score(item)?, item)))
            .collect()
    }
}

/// Number of candidates that make the top `fraction` of `len` items:
/// `ceil(fraction * len)`, clamped to `0..=len`.
pub fn top_fraction_len(len: usize, fraction: Decimal) -> usize {
    let scaled = fraction.saturating_mul(Decimal::from(len)).ceil();
    if scaled.is_sign_negative() {
        return 0;
    }
    scaled.to_usize().map_or(len, |n| n.min(len))
}

/// Read `criteria.csv` into a ranking sorted by ascending rank.
///
/// # Errors
///
/// Returns [`AgentError::PreferenceFile`] on I/O failure or a malformed row.
pub fn read_criteria_csv(path: &Path) -> Result<Vec<Criterion>, AgentError> {
    let table = CsvTable::read(path, &["criterion_name", "rank"])?;
    let mut ranked = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let [criterion, rank] = row.fields.as_slice() else {
            return Err(table.malformed(row.line, "expected 2 fields"));
        };
        let criterion = criterion
            .parse::<Criterion>()
            .map_err(|e| table.malformed(row.line, &e.to_string()))?;
        let rank = rank
            .parse::<u32>()
            .map_err(|e| table.malformed(row.line, &format!("invalid rank: {e}")))?;
        ranked.push((rank, criterion));
    }

    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, criterion)| criterion).collect())
}

fn validate_ranking(ranking: &[Criterion]) -> Result<(), AgentError> {
    if ranking.len() != Criterion::ALL.len() {
        return Err(AgentError::InvalidRanking {
            reason: format!(
                "expected {} criteria, got {}",
                Criterion::ALL.len(),
                ranking.len()
            ),
        });
    }
    if let Some(missing) = Criterion::ALL.iter().find(|c| !ranking.contains(c)) {
        return Err(AgentError::InvalidRanking {
            reason: format!("{missing} is missing"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Minimal CSV table reader
// ---------------------------------------------------------------------------

struct CsvRow {
    /// 1-based line number in the file.
    line: usize,
    /// Fields reordered to match the requested columns.
    fields: Vec<String>,
}

struct CsvTable {
    path: PathBuf,
    rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Read a headed CSV file and project each row onto `columns`.
    ///
    /// Columns are located by header name, so extra columns (such as an
    /// index column) and any column order are accepted.
    fn read(path: &Path, columns: &[&str]) -> Result<Self, AgentError> {
        let contents = fs::read_to_string(path).map_err(|e| AgentError::PreferenceFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut lines = contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i.saturating_add(1), line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let Some((_, header)) = lines.next() else {
            return Err(AgentError::PreferenceFile {
                path: path.to_path_buf(),
                reason: String::from("file is empty"),
            });
        };
        let header: Vec<&str> = header.split(',').map(str::trim).collect();

        let positions = columns
            .iter()
            .map(|column| {
                header
                    .iter()
                    .position(|h| h == column)
                    .ok_or_else(|| AgentError::PreferenceFile {
                        path: path.to_path_buf(),
                        reason: format!("missing column \"{column}\""),
                    })
            })
            .collect::<Result<Vec<usize>, AgentError>>()?;

        let rows = lines
            .map(|(line, text)| {
                let raw: Vec<&str> = text.split(',').map(str::trim).collect();
                let fields = positions
                    .iter()
                    .filter_map(|&p| raw.get(p).map(|f| (*f).to_owned()))
                    .collect();
                CsvRow { line, fields }
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    fn malformed(&self, line: usize, reason: &str) -> AgentError {
        AgentError::PreferenceFile {
            path: self.path.clone(),
            reason: format!("line {line}: {reason}"),
        }
    }
}
