use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use keepset_cache::ObjectCache;
use keepset_store::RowStore;
use keepset_strategy::{EmbeddedRefExtractor, RootStrategy};
use keepset_types::{Object, ObjectId, RetainedEntry};

use crate::error::{MarkError, MarkResult};
use crate::report::{MarkReport, Pass};

/// Lifetime of the object cache during a strategy pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// One cache for the whole pass.
    #[default]
    PerStrategy,
    /// A fresh cache for every page.
    PerPage,
}

/// Marker settings.
#[derive(Clone, Debug)]
pub struct MarkerConfig {
    /// Rows per page of a strategy query.
    pub page_size: usize,
    pub cache_policy: CachePolicy,
    pub extractor: EmbeddedRefExtractor,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            cache_policy: CachePolicy::default(),
            extractor: EmbeddedRefExtractor::default(),
        }
    }
}

/// Computes the retain-set.
///
/// The marker only ever inserts into the retain-set; resetting it is the
/// caller's decision.
pub struct Marker<'s> {
    store: &'s dyn RowStore,
    config: MarkerConfig,
}

impl<'s> Marker<'s> {
    pub fn new(store: &'s dyn RowStore, config: MarkerConfig) -> MarkResult<Self> {
        if config.page_size == 0 {
            return Err(MarkError::ZeroPageSize);
        }
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Run every primary pass in order, then every backfill pass.
    pub fn mark_all(&self, strategies: &[Box<dyn RootStrategy>]) -> MarkResult<Vec<MarkReport>> {
        let mut reports = Vec::new();
        for strategy in strategies {
            reports.extend(self.run_pass(strategy.as_ref(), Pass::Primary)?);
        }
        for strategy in strategies {
            reports.extend(self.run_pass(strategy.as_ref(), Pass::Backfill)?);
        }
        Ok(reports)
    }

    /// Run one pass of one strategy. Returns `None` when the strategy has no
    /// query for that pass.
    pub fn run_pass(
        &self,
        strategy: &dyn RootStrategy,
        pass: Pass,
    ) -> MarkResult<Option<MarkReport>> {
        let filter = match pass {
            Pass::Primary => strategy.primary_query()?,
            Pass::Backfill => match strategy.backfill_query()? {
                Some(filter) => filter,
                None => {
                    debug!(strategy = strategy.name(), "backfill skipped");
                    return Ok(None);
                }
            },
        };

        info!(strategy = strategy.name(), pass = %pass, "marking");
        let mut report = MarkReport::new(strategy.name(), pass);
        let mut cache = ObjectCache::new(self.store);
        let mut retained = self.store.retained_count()?;
        let mut after: Option<ObjectId> = None;

        loop {
            let ids = self.store.select_ids(&filter, after, self.config.page_size)?;
            let Some(last) = ids.last().copied() else {
                break;
            };
            report.pages += 1;

            let inserted = self.mark_page(strategy, pass, &ids, &mut cache, &mut report)?;

            let now = self.store.retained_count()?;
            if now < retained {
                return Err(MarkError::RetainSetShrank {
                    strategy: strategy.name().to_string(),
                    before: retained,
                    after: now,
                });
            }
            retained = now;

            debug!(
                strategy = strategy.name(),
                page = report.pages,
                rows = ids.len(),
                inserted,
                retained,
                "page marked"
            );

            if self.config.cache_policy == CachePolicy::PerPage {
                cache.clear();
            }
            if ids.len() < self.config.page_size {
                break;
            }
            after = Some(last);
        }

        report.cache = cache.stats();
        info!(
            strategy = strategy.name(),
            pass = %pass,
            pages = report.pages,
            inserted = report.inserted,
            retained,
            "strategy pass complete"
        );
        Ok(Some(report))
    }

    /// Retain one page of roots and everything they pull in. Returns the
    /// number of new retain-set entries.
    fn mark_page(
        &self,
        strategy: &dyn RootStrategy,
        pass: Pass,
        ids: &[ObjectId],
        cache: &mut ObjectCache<'_>,
        report: &mut MarkReport,
    ) -> MarkResult<u64> {
        let roots: Vec<Object> = cache.get_many(ids.iter().copied())?.into_values().collect();
        report.roots += roots.len() as u64;
        let mut keep: BTreeMap<ObjectId, Object> =
            roots.iter().map(|o| (o.id, o.clone())).collect();

        let embedded = cache.get_many(self.config.extractor.extract_all(&roots))?;
        report.embedded += embedded.len() as u64;
        keep.extend(embedded);

        if strategy.find_linked_ids() {
            let linked = strategy.resolve_linked(&roots, cache)?;
            report.linked += linked.len() as u64;
            keep.extend(linked.into_iter().map(|o| (o.id, o)));
        }

        if pass == Pass::Backfill {
            let ancestors = ancestors(&roots, cache)?;
            report.ancestors += ancestors.len() as u64;
            keep.extend(ancestors.into_iter().map(|o| (o.id, o)));
        }

        let entries: Vec<RetainedEntry> = keep.values().map(RetainedEntry::from).collect();
        let inserted = self.store.insert_retained(&entries)?;
        report.inserted += inserted;
        Ok(inserted)
    }
}

/// Every ancestor of `objects`, one batched read per generation.
fn ancestors(objects: &[Object], cache: &mut ObjectCache<'_>) -> MarkResult<Vec<Object>> {
    let mut seen: BTreeSet<ObjectId> = objects.iter().map(|o| o.id).collect();
    let mut frontier: BTreeSet<ObjectId> = objects
        .iter()
        .filter_map(|o| o.parent_id)
        .filter(|p| !seen.contains(p))
        .collect();
    let mut found = Vec::new();

    while !frontier.is_empty() {
        seen.extend(frontier.iter().copied());
        let generation = cache.get_many(std::mem::take(&mut frontier))?;
        for parent in generation.into_values() {
            if let Some(grandparent) = parent.parent_id {
                if !seen.contains(&grandparent) {
                    frontier.insert(grandparent);
                }
            }
            found.push(parent);
        }
    }
    Ok(found)
}

impl std::fmt::Debug for Marker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marker").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use keepset_store::fixtures::DatasetBuilder;
    use keepset_store::{InMemoryRowStore, Statement, TypeSelector};
    use keepset_strategy::{DeclarativeStrategy, LinkResolver, RecencyWindow, StrategySpec};
    use keepset_types::ObjectType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn types(names: &[&str]) -> TypeSelector {
        TypeSelector::Types(names.iter().map(|n| ObjectType::new(*n).unwrap()).collect())
    }

    fn strategy(spec: StrategySpec) -> Box<dyn RootStrategy> {
        Box::new(DeclarativeStrategy::new(spec, now()).unwrap())
    }

    fn retained(store: &InMemoryRowStore) -> Vec<u64> {
        store.retained_ids().unwrap().into_iter().map(ObjectId::get).collect()
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let store = InMemoryRowStore::new();
        let config = MarkerConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(Marker::new(&store, config), Err(MarkError::ZeroPageSize)));
    }

    #[test]
    fn twelve_hundred_roots_take_three_pages() {
        let mut builder = DatasetBuilder::new();
        for id in 1..=1200 {
            builder = builder.object(id, "post");
        }
        let store = builder.build_store().unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();

        let report = marker
            .run_pass(
                strategy(StrategySpec::new("posts", types(&["post"]))).as_ref(),
                Pass::Primary,
            )
            .unwrap()
            .unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.roots, 1200);
        assert_eq!(report.inserted, 1200);
        assert_eq!(store.retained_count().unwrap(), 1200);
        // The short third page ends pagination without another select.
        assert_eq!(store.statement_count(Statement::SelectIds), 3);
        assert_eq!(store.statement_count(Statement::InsertRetained), 3);
    }

    #[test]
    fn exact_multiple_ends_on_empty_page() {
        let mut builder = DatasetBuilder::new();
        for id in 1..=10 {
            builder = builder.object(id, "post");
        }
        let store = builder.build_store().unwrap();
        let config = MarkerConfig {
            page_size: 5,
            ..Default::default()
        };
        let marker = Marker::new(&store, config).unwrap();
        let report = marker
            .run_pass(
                strategy(StrategySpec::new("posts", types(&["post"]))).as_ref(),
                Pass::Primary,
            )
            .unwrap()
            .unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(store.statement_count(Statement::SelectIds), 3);
        assert_eq!(store.retained_count().unwrap(), 10);
    }

    #[test]
    fn embedded_and_linked_objects_are_retained() {
        let store = DatasetBuilder::new()
            .object(1, "topic")
            .object(2, "attachment")
            .object(3, "attachment")
            .object(10, "reply")
            .content(10, r#"<!-- wp:image {"id":2} /-->"#)
            .meta(10, "_bbp_topic_id", "1")
            .build_store()
            .unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();
        let spec = StrategySpec::new("replies", types(&["reply"]))
            .skip_backfill()
            .link(LinkResolver::MetaPointers {
                keys: vec!["_bbp_topic_id".into()],
            });

        let reports = marker.mark_all(&[strategy(spec)]).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].embedded, 1);
        assert_eq!(reports[0].linked, 1);
        assert_eq!(retained(&store), vec![1, 2, 10]);
    }

    #[test]
    fn recency_window_limits_primary_but_not_backfill() {
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let store = DatasetBuilder::new()
            .object_at(1, "post", old)
            .object_at(2, "post", recent)
            .object_at(3, "post", old)
            .content(3, r#"<!-- wp:image {"id":4} /-->"#)
            .object_at(4, "attachment", old)
            // Retained by an earlier strategy; backfill revisits it.
            .retained(3, "post")
            .build_store()
            .unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();
        let spec = StrategySpec::new("posts", types(&["post"])).within(RecencyWindow::Months(3));

        let reports = marker.mark_all(&[strategy(spec)]).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].pass, Pass::Primary);
        assert_eq!(reports[0].roots, 1);
        assert_eq!(reports[1].pass, Pass::Backfill);
        assert_eq!(reports[1].roots, 2);
        assert_eq!(retained(&store), vec![2, 3, 4]);
    }

    #[test]
    fn backfill_retains_ancestor_chain() {
        let store = DatasetBuilder::new()
            .object(1, "page")
            .child(2, "page", 1)
            .child(3, "page", 2)
            .child(4, "page", 99)
            .object(5, "page")
            .retained(3, "page")
            .retained(4, "page")
            .build_store()
            .unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();
        let report = marker
            .run_pass(
                strategy(StrategySpec::new("pages", types(&["page"]))).as_ref(),
                Pass::Primary,
            )
            .unwrap()
            .unwrap();
        assert_eq!(report.ancestors, 0);

        store.reset_retain_set().unwrap();
        store
            .insert_retained(&[
                RetainedEntry::new(ObjectId::new(3), ObjectType::new("page").unwrap()),
                RetainedEntry::new(ObjectId::new(4), ObjectType::new("page").unwrap()),
            ])
            .unwrap();
        let report = marker
            .run_pass(
                strategy(StrategySpec::new("pages", types(&["page"]))).as_ref(),
                Pass::Backfill,
            )
            .unwrap()
            .unwrap();
        // 99 does not exist, so only 3's chain is found.
        assert_eq!(report.ancestors, 2);
        assert_eq!(retained(&store), vec![1, 2, 3, 4]);
    }

    #[test]
    fn skipped_backfill_produces_no_report() {
        let store = DatasetBuilder::new().object(1, "reply").build_store().unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();
        let spec = StrategySpec::new("replies", types(&["reply"])).skip_backfill();
        assert!(marker
            .run_pass(strategy(spec).as_ref(), Pass::Backfill)
            .unwrap()
            .is_none());
    }

    #[test]
    fn per_page_cache_rereads_shared_targets() {
        let mut builder = DatasetBuilder::new().object(100, "attachment");
        for id in 1..=4 {
            builder = builder
                .object(id, "post")
                .content(id, r#"<!-- wp:image {"id":100} /-->"#);
        }
        let per_strategy = builder.build_store().unwrap();
        let per_page = InMemoryRowStore::from_dataset(per_strategy.to_dataset().unwrap()).unwrap();
        let spec = || strategy(StrategySpec::new("posts", types(&["post"])).skip_backfill());

        let config = MarkerConfig {
            page_size: 2,
            ..Default::default()
        };
        let report = Marker::new(&per_strategy, config.clone())
            .unwrap()
            .mark_all(&[spec()])
            .unwrap();
        // Page 1 reads the roots and the shared attachment; page 2 only its roots.
        assert_eq!(report[0].cache.batch_reads, 3);

        let config = MarkerConfig {
            cache_policy: CachePolicy::PerPage,
            ..config
        };
        let report = Marker::new(&per_page, config)
            .unwrap()
            .mark_all(&[spec()])
            .unwrap();
        assert_eq!(report[0].cache.batch_reads, 4);
        assert_eq!(retained(&per_strategy), retained(&per_page));
    }

    #[test]
    fn failing_insert_aborts_the_pass() {
        let store = DatasetBuilder::new().object(1, "post").build_store().unwrap();
        let marker = Marker::new(&store, MarkerConfig::default()).unwrap();
        store.fail_next(Statement::InsertRetained);
        let err = marker
            .run_pass(
                strategy(StrategySpec::new("posts", types(&["post"]))).as_ref(),
                Pass::Primary,
            )
            .unwrap_err();
        assert!(matches!(err, MarkError::Store(_)));
    }

    #[test]
    fn cache_policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CachePolicy::PerPage).unwrap(),
            "\"per_page\""
        );
    }
}
