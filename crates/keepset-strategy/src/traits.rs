//! The [`RootStrategy`] trait: the contract between the marker and the
//! rules that pick what to keep.

use keepset_cache::ObjectCache;
use keepset_store::ObjectFilter;
use keepset_types::Object;

use crate::error::StrategyResult;

/// A rule selecting root objects to retain.
///
/// Strategies are pure read-only producers. The marker asks for the primary
/// query, pages through it, and hands each page back through
/// [`resolve_linked`](Self::resolve_linked) so the strategy can name the
/// objects its roots depend on.
///
/// The trait is object-safe and `Send + Sync` so strategies can be stored
/// in a `Vec<Box<dyn RootStrategy>>`.
pub trait RootStrategy: Send + Sync {
    /// Human-readable name used in progress output.
    fn name(&self) -> &str;

    /// Filter selecting this strategy's roots.
    fn primary_query(&self) -> StrategyResult<ObjectFilter>;

    /// Filter for the backfill pass, which only sees ids already retained.
    ///
    /// Default: the primary query without its recency window, restricted to
    /// retained ids; `None` when [`skip_backfill`](Self::skip_backfill).
    fn backfill_query(&self) -> StrategyResult<Option<ObjectFilter>> {
        if self.skip_backfill() {
            return Ok(None);
        }
        Ok(Some(self.primary_query()?.into_backfill()))
    }

    /// Whether the backfill pass is skipped for this strategy.
    fn skip_backfill(&self) -> bool {
        false
    }

    /// Whether [`resolve_linked`](Self::resolve_linked) should be called.
    fn find_linked_ids(&self) -> bool {
        true
    }

    /// Objects that must be retained because one page of roots depends on
    /// them.
    fn resolve_linked(
        &self,
        _objects: &[Object],
        _cache: &mut ObjectCache<'_>,
    ) -> StrategyResult<Vec<Object>> {
        Ok(Vec::new())
    }

    /// Check the strategy can produce its queries. Called before any
    /// mutation so configuration mistakes abort the job early.
    fn validate(&self) -> StrategyResult<()> {
        self.primary_query()?;
        self.backfill_query()?;
        Ok(())
    }
}
