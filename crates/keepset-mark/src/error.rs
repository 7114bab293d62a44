use thiserror::Error;

use keepset_cache::CacheError;
use keepset_store::StoreError;
use keepset_strategy::StrategyError;

/// Errors raised while marking.
#[derive(Debug, Error)]
pub enum MarkError {
    #[error("strategy failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The retain-set got smaller while marking, which only an outside
    /// writer can cause.
    #[error("retain-set shrank during {strategy}: {before} -> {after} entries")]
    RetainSetShrank {
        strategy: String,
        before: u64,
        after: u64,
    },

    #[error("page size must be positive")]
    ZeroPageSize,
}

pub type MarkResult<T> = Result<T, MarkError>;
