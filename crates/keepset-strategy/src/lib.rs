//! Root-selection strategies for keepset.
//!
//! A strategy answers two questions for the marker: which objects are
//! roots (a paginated [`ObjectFilter`](keepset_store::ObjectFilter)), and
//! which other objects a page of roots depends on. Strategies are usually
//! declared in the job file as [`StrategySpec`] values and turned into
//! [`DeclarativeStrategy`]s; custom rules implement [`RootStrategy`]
//! directly.
//!
//! # Design Rules
//!
//! 1. Strategies never write; the marker owns every retain-set insert.
//! 2. Every type selection is explicit. `types = "any"` must skip backfill.
//! 3. Recency windows are resolved against an injected clock, never the
//!    system time.
//! 4. Linked-object reads go through the [`ObjectCache`](keepset_cache::ObjectCache)
//!    in batches.

pub mod blocks;
pub mod declarative;
pub mod error;
pub mod presets;
pub mod spec;
pub mod traits;
pub mod window;

pub use blocks::{EmbeddedRefExtractor, DEFAULT_REF_KEYS};
pub use declarative::DeclarativeStrategy;
pub use error::{StrategyError, StrategyResult};
pub use spec::{LinkResolver, StrategySpec};
pub use traits::RootStrategy;
pub use window::RecencyWindow;
