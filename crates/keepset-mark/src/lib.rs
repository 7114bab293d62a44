//! Retention marker for keepset.
//!
//! The marker runs root strategies over paginated queries and inserts every
//! root, every object its content embeds, and every object its strategy
//! links to into the persisted retain-set. After all primary passes, a
//! backfill pass revisits what was retained without the recency window and
//! also retains each root's ancestor chain.
//!
//! # Design Rules
//!
//! 1. Pagination is keyset-based (`id > last`), ordered by id ascending.
//! 2. A page shorter than the page size is the last page.
//! 3. Retain-set inserts ignore duplicates, so re-marking is idempotent.
//! 4. The retain-set never shrinks while marking; a shrink is an error.

pub mod error;
pub mod marker;
pub mod report;

pub use error::{MarkError, MarkResult};
pub use marker::{CachePolicy, Marker, MarkerConfig};
pub use report::{MarkReport, Pass};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use keepset_store::fixtures::DatasetBuilder;
    use keepset_store::{InMemoryRowStore, RowStore, TypeSelector};
    use keepset_strategy::{DeclarativeStrategy, RecencyWindow, RootStrategy, StrategySpec};
    use keepset_types::{Object, ObjectId, ObjectType};

    const TYPES: [&str; 3] = ["post", "page", "attachment"];

    fn build_store(rows: &[(usize, Option<usize>, i64)]) -> InMemoryRowStore {
        let base = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let mut builder = DatasetBuilder::new();
        for (i, (ty, parent, age_days)) in rows.iter().enumerate() {
            let id = i as u64 + 1;
            let mut object = Object::new(
                ObjectId::new(id),
                ObjectType::new(TYPES[*ty]).unwrap(),
                base - Duration::days(*age_days),
            );
            if let Some(p) = parent.filter(|p| *p < i) {
                object = object.with_parent(ObjectId::new(p as u64 + 1));
            }
            builder = builder.with(object);
        }
        builder.build_store().unwrap()
    }

    fn strategies(decls: &[(usize, Option<u32>)]) -> Vec<Box<dyn RootStrategy>> {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        decls
            .iter()
            .enumerate()
            .map(|(i, (ty, days))| {
                let mut spec = StrategySpec::new(
                    format!("s{i}"),
                    TypeSelector::Types(vec![ObjectType::new(TYPES[*ty]).unwrap()]),
                );
                if let Some(d) = days {
                    spec = spec.within(RecencyWindow::Days(*d));
                }
                Box::new(DeclarativeStrategy::new(spec, now).unwrap()) as Box<dyn RootStrategy>
            })
            .collect()
    }

    proptest! {
        #[test]
        fn marking_is_monotonic_and_idempotent(
            rows in prop::collection::vec((0usize..3, prop::option::of(0usize..40), 0i64..400), 0..40),
            decls in prop::collection::vec((0usize..3, prop::option::of(1u32..200)), 1..4),
            page_size in 1usize..7,
        ) {
            let store = build_store(&rows);
            let strategies = strategies(&decls);
            let config = MarkerConfig { page_size, ..Default::default() };
            let marker = Marker::new(&store, config).unwrap();

            marker.mark_all(&strategies).unwrap();
            let first = store.retained_ids().unwrap();

            // Every primary root is retained.
            for strategy in &strategies {
                let filter = strategy.primary_query().unwrap();
                let roots = store.select_ids(&filter, None, rows.len().max(1)).unwrap();
                for id in roots {
                    prop_assert!(first.contains(&id));
                }
            }

            let again = marker.mark_all(&strategies).unwrap();
            prop_assert!(again.iter().all(|r| r.inserted == 0));
            prop_assert_eq!(store.retained_ids().unwrap(), first);
        }
    }
}
