//! # Error Types
//!
//! Errors raised while constructing core primitives from untrusted input
//! (operator flags, backend payloads).

use thiserror::Error;

/// Error constructing an `apx-core` primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was empty or whitespace-only.
    #[error("invalid {kind} identifier: {reason}")]
    InvalidIdentifier {
        /// Which identifier namespace was being constructed.
        kind: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed in any accepted format.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The raw input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A page request was out of range.
    #[error("invalid page request: {0}")]
    InvalidPage(String),
}
