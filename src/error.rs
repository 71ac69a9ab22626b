// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use thiserror::Error;

/// Result type for transaction operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while working with a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The key was deleted earlier in the same transaction.
    #[error("key {key} has been deleted in the current transaction")]
    Deleted {
        /// `Debug` rendering of the key.
        key: String,
    },

    /// The key is neither in the base map nor staged in the transaction.
    #[error("key {key} is not in the base map nor in the transaction")]
    NotFound {
        /// `Debug` rendering of the key.
        key: String,
    },

    /// A transaction was requested over something that is not a map.
    #[error("a transaction can only be opened over a map, found {found}")]
    PreconditionViolation {
        /// Short name of what was found instead.
        found: &'static str,
    },

    /// Input has no [`Value`](crate::Value) representation.
    #[error("{found} values are not supported")]
    Unsupported {
        /// Short name of the unsupported kind.
        found: &'static str,
    },
}

impl Error {
    pub(crate) fn deleted(key: &impl std::fmt::Debug) -> Self {
        Error::Deleted {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn not_found(key: &impl std::fmt::Debug) -> Self {
        Error::NotFound {
            key: format!("{key:?}"),
        }
    }
}
