use thiserror::Error;

use keepset_cache::CacheError;
use keepset_store::StoreError;

/// Errors raised while sweeping.
///
/// Any store failure aborts the current batch and the sweep. Nothing is
/// rolled back; statements already executed stay applied.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("batch size must be positive")]
    ZeroBatchSize,

    #[error("safety factor must be a finite number >= 1, got {0}")]
    InvalidSafetyFactor(f64),
}

pub type SweepResult<T> = Result<T, SweepError>;
