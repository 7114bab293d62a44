//! Error types for root strategies.

use thiserror::Error;

use keepset_cache::CacheError;
use keepset_store::StoreError;

/// Errors raised while building or running a root strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A strategy was declared without a name.
    #[error("strategy name must not be empty")]
    EmptyName,

    /// A required field is missing from a strategy declaration.
    #[error("strategy {strategy}: missing required field `{field}`")]
    MissingField { strategy: String, field: &'static str },

    /// A field is present but unusable.
    #[error("strategy {strategy}: invalid `{field}`: {reason}")]
    InvalidField {
        strategy: String,
        field: &'static str,
        reason: String,
    },

    /// Backfill was requested for a strategy that matches every type.
    #[error("strategy {strategy}: backfill cannot be applied to `types = \"any\"`; set skip_backfill")]
    BackfillOnAnyType { strategy: String },

    /// A recency window could not be parsed.
    #[error("invalid recency window {0:?}: expected \"<n> days|weeks|months|years\"")]
    InvalidWindow(String),

    /// Reading linked objects through the cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Reading meta entries from the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for strategy operations.
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;
