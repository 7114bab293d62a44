//! [`RootStrategy`] built from a [`StrategySpec`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use keepset_cache::ObjectCache;
use keepset_store::ObjectFilter;
use keepset_types::{Object, ObjectId};

use crate::error::StrategyResult;
use crate::spec::{LinkResolver, StrategySpec};
use crate::traits::RootStrategy;

/// A declared strategy bound to the job clock.
#[derive(Clone, Debug)]
pub struct DeclarativeStrategy {
    spec: StrategySpec,
    now: DateTime<Utc>,
}

impl DeclarativeStrategy {
    /// Validate `spec` and bind it to `now`, the instant recency windows are
    /// measured from.
    pub fn new(spec: StrategySpec, now: DateTime<Utc>) -> StrategyResult<Self> {
        spec.validate()?;
        Ok(Self { spec, now })
    }

    pub fn spec(&self) -> &StrategySpec {
        &self.spec
    }
}

impl RootStrategy for DeclarativeStrategy {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn primary_query(&self) -> StrategyResult<ObjectFilter> {
        let mut filter = ObjectFilter::for_types(self.spec.types()?.clone());
        filter.statuses = self.spec.statuses.clone();
        filter.search = self.spec.search.clone();
        filter.meta = self.spec.meta.clone();
        if let Some(window) = self.spec.within {
            filter = filter.published_after(window.cutoff(self.now));
        }
        Ok(filter)
    }

    fn skip_backfill(&self) -> bool {
        self.spec.skip_backfill
    }

    fn find_linked_ids(&self) -> bool {
        !self.spec.link.is_none()
    }

    fn resolve_linked(
        &self,
        objects: &[Object],
        cache: &mut ObjectCache<'_>,
    ) -> StrategyResult<Vec<Object>> {
        let ids: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let targets = match &self.spec.link {
            LinkResolver::None => return Ok(Vec::new()),
            LinkResolver::MetaPointers { keys } => meta_pointers(cache, &ids, keys)?,
            LinkResolver::MenuItemTarget {
                kind_key,
                kind_value,
                object_key,
            } => menu_item_targets(cache, &ids, kind_key, kind_value, object_key)?,
        };

        debug!(
            strategy = %self.spec.name,
            roots = ids.len(),
            targets = targets.len(),
            "resolved linked ids"
        );
        Ok(cache.get_many(targets)?.into_values().collect())
    }
}

fn meta_pointers(
    cache: &ObjectCache<'_>,
    ids: &[ObjectId],
    keys: &[String],
) -> StrategyResult<BTreeSet<ObjectId>> {
    let mut targets = BTreeSet::new();
    for key in keys {
        for entry in cache.store().fetch_meta(ids, key)? {
            targets.extend(ObjectId::parse_pointer(&entry.value));
        }
    }
    Ok(targets)
}

fn menu_item_targets(
    cache: &ObjectCache<'_>,
    ids: &[ObjectId],
    kind_key: &str,
    kind_value: &str,
    object_key: &str,
) -> StrategyResult<BTreeSet<ObjectId>> {
    let store = cache.store();
    let matching: BTreeSet<ObjectId> = store
        .fetch_meta(ids, kind_key)?
        .into_iter()
        .filter(|e| e.value == kind_value)
        .map(|e| e.object_id)
        .collect();
    if matching.is_empty() {
        return Ok(BTreeSet::new());
    }
    let matching: Vec<ObjectId> = matching.into_iter().collect();
    Ok(store
        .fetch_meta(&matching, object_key)?
        .into_iter()
        .filter_map(|e| ObjectId::parse_pointer(&e.value))
        .collect())
}
