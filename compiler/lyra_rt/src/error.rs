//! Runtime value errors.
//!
//! `TypeMismatch` (and the wrapped `TypeError`s) indicate a defect earlier
//! in the pipeline and are treated as fatal by callers.
//! `InvalidAggregateAccess` is reachable from valid user programs — an
//! index out of range, a missing dict key — and is surfaced to the
//! executing program as a catchable error.

use std::fmt;

use lyra_types::TypeError;

/// Error from conversion, access, or lifecycle preconditions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A value's declared type disagrees with what is physically present.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the declared type promised.
        expected: String,
        /// What was actually there.
        found: String,
    },

    /// Element access outside an aggregate's bounds.
    #[error("invalid aggregate access: {reason}")]
    InvalidAggregateAccess {
        /// What was attempted and why it failed.
        reason: String,
    },

    /// A type table failure, surfaced through a conversion.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl RuntimeError {
    pub(crate) fn mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn index_out_of_range(index: usize, len: usize) -> Self {
        RuntimeError::InvalidAggregateAccess {
            reason: format!("index {index} out of range for length {len}"),
        }
    }

    pub(crate) fn key_not_found(key: &str) -> Self {
        RuntimeError::InvalidAggregateAccess {
            reason: format!("key {key:?} not present"),
        }
    }

    pub(crate) fn no_such_member(index: usize, count: usize) -> Self {
        RuntimeError::InvalidAggregateAccess {
            reason: format!("member {index} out of range for struct with {count} members"),
        }
    }
}
