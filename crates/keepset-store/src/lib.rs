//! Row-store interface for keepset.
//!
//! The pruning engine never talks to a database directly. Everything it
//! needs (batched selects, the anti-join against the retain-set, batched
//! updates and join deletes) is expressed by the [`RowStore`] trait, one
//! method per statement.
//!
//! # Backends
//!
//! - [`InMemoryRowStore`] -- ordered-map tables for tests, demos and
//!   [`Dataset`] files
//!
//! # Design Rules
//!
//! 1. Every call is a single statement; no transaction spans two calls.
//! 2. Id-returning selects are ordered by id ascending.
//! 3. Batched reads skip missing ids instead of failing.
//! 4. Retain-set inserts ignore duplicates.
//! 5. All backend errors are propagated, never silently ignored.

pub mod dataset;
pub mod error;
pub mod fixtures;
pub mod memory;
pub mod query;
pub mod traits;

pub use dataset::Dataset;
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryRowStore, JournalRecord, Statement, TableCounts};
pub use query::{MetaCondition, ObjectFilter, TypeSelector};
pub use traits::RowStore;
