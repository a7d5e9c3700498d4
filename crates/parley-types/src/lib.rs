//! Shared type definitions for the Parley negotiation simulation.
//!
//! This crate is the single source of truth for the data exchanged between
//! negotiating agents. It performs no I/O.
//!
//! # Modules
//!
//! - [`enums`] -- Criteria, ordinal values, polarity, and performatives
//! - [`item`] -- Negotiable items and the insertion-ordered [`ItemCatalog`]
//! - [`argument`] -- Premises, arguments, and the argument text grammar
//! - [`message`] -- Wire messages and typed speech acts ([`Act`])
//! - [`error`] -- [`ArgumentParseError`]

pub mod argument;
pub mod enums;
pub mod error;
pub mod item;
pub mod message;

// Re-export all public types at crate root for convenience.
pub use argument::{Argument, Comparison, Equality};
pub use enums::{Criterion, Performative, Polarity, Value};
pub use error::ArgumentParseError;
pub use item::{Item, ItemCatalog};
pub use message::{Act, Message};
