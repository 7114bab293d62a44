use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use keepset_store::RowStore;
use keepset_types::{Object, ObjectId};

use crate::error::CacheResult;

/// Lookup counters for one cache lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Ids answered without touching the store.
    pub hits: u64,
    /// Ids that had to be read from the store.
    pub misses: u64,
    /// Batched store reads issued by `get_many`.
    pub batch_reads: u64,
    /// Single-id store reads issued by `get`.
    pub single_reads: u64,
}

impl CacheStats {
    /// Fold another set of counters into this one.
    pub fn absorb(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.batch_reads += other.batch_reads;
        self.single_reads += other.single_reads;
    }
}

/// Memoized `id -> Object` lookups over a [`RowStore`].
///
/// Rows are cached as they were when first read. Ids the store reported
/// missing are remembered too, so neither present nor absent ids are read
/// twice until [`clear`](Self::clear).
pub struct ObjectCache<'s> {
    store: &'s dyn RowStore,
    entries: HashMap<ObjectId, Object>,
    absent: HashSet<ObjectId>,
    stats: CacheStats,
}

impl<'s> ObjectCache<'s> {
    pub fn new(store: &'s dyn RowStore) -> Self {
        Self {
            store,
            entries: HashMap::new(),
            absent: HashSet::new(),
            stats: CacheStats::default(),
        }
    }

    /// The store this cache reads through.
    pub fn store(&self) -> &'s dyn RowStore {
        self.store
    }

    /// Look up one object.
    ///
    /// An uncached id costs a single-row store read and logs a warning:
    /// traversal code is expected to prefetch with [`get_many`](Self::get_many).
    pub fn get(&mut self, id: ObjectId) -> CacheResult<Option<Object>> {
        if let Some(object) = self.entries.get(&id) {
            self.stats.hits += 1;
            return Ok(Some(object.clone()));
        }
        if self.absent.contains(&id) {
            self.stats.hits += 1;
            return Ok(None);
        }

        self.stats.misses += 1;
        self.stats.single_reads += 1;
        warn!(id = %id, "object cache miss on single lookup; batch fetch path skipped this id");

        match self.store.fetch_object(id)? {
            Some(object) => {
                self.entries.insert(id, object.clone());
                Ok(Some(object))
            }
            None => {
                self.absent.insert(id);
                Ok(None)
            }
        }
    }

    /// Look up many objects with at most one batched store read.
    ///
    /// The result holds only ids that exist.
    pub fn get_many(
        &mut self,
        ids: impl IntoIterator<Item = ObjectId>,
    ) -> CacheResult<BTreeMap<ObjectId, Object>> {
        let wanted: BTreeSet<ObjectId> = ids.into_iter().collect();
        let missing: Vec<ObjectId> = wanted
            .iter()
            .filter(|id| !self.entries.contains_key(id) && !self.absent.contains(id))
            .copied()
            .collect();

        self.stats.hits += (wanted.len() - missing.len()) as u64;

        if !missing.is_empty() {
            self.stats.misses += missing.len() as u64;
            self.stats.batch_reads += 1;
            let rows = self.store.fetch_objects(&missing)?;
            debug!(requested = missing.len(), found = rows.len(), "object cache batch read");
            for row in rows {
                self.entries.insert(row.id, row);
            }
            for id in missing {
                if !self.entries.contains_key(&id) {
                    self.absent.insert(id);
                }
            }
        }

        Ok(wanted
            .into_iter()
            .filter_map(|id| self.entries.get(&id).map(|o| (id, o.clone())))
            .collect())
    }

    /// Seed the cache with a row read elsewhere.
    pub fn put(&mut self, object: Object) {
        self.absent.remove(&object.id);
        self.entries.insert(object.id, object);
    }

    /// Evict ids, e.g. after their rows were deleted.
    pub fn forget(&mut self, ids: &[ObjectId]) {
        for id in ids {
            self.entries.remove(id);
            self.absent.remove(id);
        }
    }

    /// Drop every cached row and absence marker. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.absent.clear();
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl std::fmt::Debug for ObjectCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCache")
            .field("entries", &self.entries.len())
            .field("absent", &self.absent.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepset_store::fixtures::DatasetBuilder;
    use keepset_store::{InMemoryRowStore, Statement};
    use keepset_types::ObjectType;

    fn id(n: u64) -> ObjectId {
        ObjectId::new(n)
    }

    fn store() -> InMemoryRowStore {
        DatasetBuilder::new()
            .object(1, "post")
            .object(2, "post")
            .object(3, "page")
            .build_store()
            .unwrap()
    }

    #[test]
    fn get_many_issues_one_read_for_uncached_ids() {
        let store = store();
        let mut cache = ObjectCache::new(&store);

        let found = cache.get_many([id(1), id(2), id(9)]).unwrap();
        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![id(1), id(2)]);
        assert_eq!(store.statement_count(Statement::FetchObjects), 1);

        // Everything requested before is answered from memory, including
        // the id known to be missing; only id 3 is read.
        let found = cache.get_many([id(1), id(2), id(3), id(9)]).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(store.statement_count(Statement::FetchObjects), 2);

        let found = cache.get_many([id(3), id(1)]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(store.statement_count(Statement::FetchObjects), 2);

        let stats = cache.stats();
        assert_eq!(stats.batch_reads, 2);
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.hits, 5);
    }

    #[test]
    fn get_many_with_empty_input_reads_nothing() {
        let store = store();
        let mut cache = ObjectCache::new(&store);
        assert!(cache.get_many(Vec::<ObjectId>::new()).unwrap().is_empty());
        assert_eq!(store.statement_count(Statement::FetchObjects), 0);
    }

    #[test]
    fn single_get_falls_back_once() {
        let store = store();
        let mut cache = ObjectCache::new(&store);

        assert_eq!(cache.get(id(3)).unwrap().unwrap().object_type, "page");
        assert!(cache.get(id(3)).unwrap().is_some());
        assert!(cache.get(id(42)).unwrap().is_none());
        assert!(cache.get(id(42)).unwrap().is_none());

        assert_eq!(cache.stats().single_reads, 2);
        assert_eq!(store.statement_count(Statement::FetchObjects), 2);
    }

    #[test]
    fn prefetched_ids_never_hit_single_path() {
        let store = store();
        let mut cache = ObjectCache::new(&store);
        cache.get_many([id(1), id(2)]).unwrap();
        cache.get(id(1)).unwrap();
        cache.get(id(2)).unwrap();
        assert_eq!(cache.stats().single_reads, 0);
    }

    #[test]
    fn put_seeds_and_clears_absence() {
        let store = store();
        let mut cache = ObjectCache::new(&store);
        assert!(cache.get_many([id(7)]).unwrap().is_empty());

        let row = keepset_types::Object::new(
            id(7),
            ObjectType::new("post").unwrap(),
            keepset_store::fixtures::default_published_at(),
        );
        cache.put(row);
        assert!(cache.get(id(7)).unwrap().is_some());
        assert_eq!(store.statement_count(Statement::FetchObjects), 1);
    }

    #[test]
    fn clear_and_forget_force_rereads() {
        let store = store();
        let mut cache = ObjectCache::new(&store);
        cache.get_many([id(1), id(2)]).unwrap();
        assert_eq!(cache.len(), 2);

        cache.forget(&[id(1)]);
        assert_eq!(cache.len(), 1);
        cache.get_many([id(1), id(2)]).unwrap();
        assert_eq!(store.statement_count(Statement::FetchObjects), 2);

        cache.clear();
        assert!(cache.is_empty());
        cache.get_many([id(1), id(2)]).unwrap();
        assert_eq!(store.statement_count(Statement::FetchObjects), 3);
    }

    #[test]
    fn store_errors_propagate() {
        let store = store();
        store.fail_next(Statement::FetchObjects);
        let mut cache = ObjectCache::new(&store);
        assert!(cache.get_many([id(1)]).is_err());
        assert!(cache.is_empty());
    }
}
