//! Negotiable items and the catalog that names them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentParseError;

/// An object the agents negotiate about. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Item {
    name: String,
    description: String,
}

impl Item {
    /// Create a new item.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// The unique name of the item.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// Insertion-ordered set of items with unique names.
///
/// The insertion order is significant: it is the stable secondary key used
/// when ranking tied items, so two catalogs built in the same order always
/// rank the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalog {
    items: Vec<Item>,
}

impl ItemCatalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item. Returns `false` and leaves the catalog untouched if an
    /// item with the same name already exists.
    pub fn insert(&mut self, item: Item) -> bool {
        if self.contains(item.name()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Look up an item by name.
    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// Look up an item by name, failing with [`ArgumentParseError::UnknownItem`].
    pub fn resolve(&self, name: &str) -> Result<&Item, ArgumentParseError> {
        let name = name.trim();
        self.get(name).ok_or_else(|| ArgumentParseError::UnknownItem {
            name: name.to_owned(),
        })
    }

    /// Whether an item with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Items in insertion order, as a slice.
    pub fn as_slice(&self) -> &[Item] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Item> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a ItemCatalog {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_not_inserted() {
        let mut catalog = ItemCatalog::new();
        assert!(catalog.insert(Item::new("E", "A very quiet engine")));
        assert!(!catalog.insert(Item::new("E", "Another description")));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("E").unwrap().description(), "A very quiet engine");
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let catalog: ItemCatalog = ["b", "a", "c"]
            .into_iter()
            .map(|n| Item::new(n, "x"))
            .collect();
        let names: Vec<&str> = catalog.iter().map(Item::name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn resolve_reports_unknown_item() {
        let catalog = ItemCatalog::new();
        let err = catalog.resolve(" ICED ").unwrap_err();
        assert_eq!(
            err,
            ArgumentParseError::UnknownItem {
                name: String::from("ICED")
            }
        );
    }

    #[test]
    fn display_includes_description() {
        let item = Item::new("ICED", "A super cool diesel engine");
        assert_eq!(item.to_string(), "ICED (A super cool diesel engine)");
    }
}
