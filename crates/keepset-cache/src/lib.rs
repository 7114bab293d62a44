//! Run-scoped object cache.
//!
//! Traversals read the same ancestors and link targets over and over. The
//! [`ObjectCache`] memoizes `id -> Object` for the lifetime of one strategy
//! run or one sweep batch so that each row is read from the store at most
//! once. It is never authoritative and can be cleared at any time.

pub mod cache;
pub mod error;

pub use cache::{CacheStats, ObjectCache};
pub use error::{CacheError, CacheResult};
