use keepset_store::StoreError;

/// Errors from cache lookups.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The store read behind a cache miss failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
