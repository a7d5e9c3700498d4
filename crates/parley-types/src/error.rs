//! Error types for the parley-types crate.
//!
//! Parsing the argument grammar and decoding wire messages are the only
//! fallible operations on shared types. Every variant carries the offending
//! text so a failed turn can be diagnosed from the log alone.

/// Errors raised while parsing a serialized argument or decoding a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentParseError {
    /// The text has no `<-` separating conclusion from premises.
    #[error("missing \"<-\" separator in argument \"{raw}\"")]
    MissingSeparator {
        /// The full raw argument text.
        raw: String,
    },

    /// The conclusion is neither `ITEM` nor `not ITEM`.
    #[error("invalid conclusion \"{conclusion}\" in argument \"{raw}\"")]
    InvalidConclusion {
        /// The conclusion text that failed to parse.
        conclusion: String,
        /// The full raw argument text.
        raw: String,
    },

    /// A premise is neither `CRITERION=VALUE` nor `CRITERION>CRITERION`.
    #[error("invalid premise \"{premise}\" in argument \"{raw}\"")]
    InvalidPremise {
        /// The premise text that failed to parse.
        premise: String,
        /// The full raw argument text.
        raw: String,
    },

    /// A criterion token is not one of the known criteria.
    #[error("unknown criterion \"{token}\"")]
    UnknownCriterion {
        /// The unrecognized token.
        token: String,
    },

    /// A value token is not one of the five known levels.
    #[error("unknown value \"{token}\"")]
    UnknownValue {
        /// The unrecognized token.
        token: String,
    },

    /// The named item is not in the catalog.
    #[error("unknown item \"{name}\"")]
    UnknownItem {
        /// The item name as it appeared in the text.
        name: String,
    },
}
