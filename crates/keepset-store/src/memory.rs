//! In-memory row store for tests, demos and file-based datasets.
//!
//! [`InMemoryRowStore`] keeps every table in ordered maps behind a single
//! `RwLock`, so each trait call behaves like one atomic statement. It also
//! counts statements by kind and keeps a journal of object-keyed writes,
//! which tests use to check batching and ordering guarantees.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use keepset_types::{
    Comment, CommentId, CommentMeta, MetaEntry, Object, ObjectId, ObjectType, RetainedEntry,
    TermRelationship, TermTaxonomy,
};

use crate::dataset::Dataset;
use crate::error::{StoreError, StoreResult};
use crate::query::ObjectFilter;
use crate::traits::RowStore;

/// Kind of statement executed against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    CountObjects,
    SelectIds,
    FetchObjects,
    FetchMeta,
    SelectChildren,
    ObjectTaxonomies,
    DeleteTermRelationships,
    CommentIdsFor,
    DeleteCommentMeta,
    DeleteComments,
    DeleteMeta,
    AnonymizeComments,
    Reparent,
    DeleteObjects,
    ResetRetainSet,
    InsertRetained,
    RetainedCount,
    SelectUnretained,
}

/// One journaled write keyed by object ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalRecord {
    pub statement: Statement,
    pub ids: Vec<ObjectId>,
}

/// Row counts per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub objects: usize,
    pub meta: usize,
    pub term_taxonomies: usize,
    pub term_relationships: usize,
    pub comments: usize,
    pub comment_meta: usize,
    pub retained: usize,
}

#[derive(Debug, Default)]
struct Tables {
    objects: BTreeMap<ObjectId, Object>,
    meta: BTreeMap<u64, MetaEntry>,
    term_taxonomies: BTreeMap<u64, TermTaxonomy>,
    term_relationships: BTreeSet<TermRelationship>,
    comments: BTreeMap<CommentId, Comment>,
    comment_meta: BTreeMap<u64, CommentMeta>,
    retained: BTreeMap<ObjectId, ObjectType>,
}

impl Tables {
    fn meta_matches(&self, object_id: ObjectId, filter: &ObjectFilter) -> bool {
        filter.meta.iter().all(|condition| {
            condition.matches(self.meta.values().filter(|m| m.object_id == object_id))
        })
    }
}

/// In-memory implementation of [`RowStore`].
pub struct InMemoryRowStore {
    tables: RwLock<Tables>,
    counters: Mutex<HashMap<Statement, u64>>,
    journal: Mutex<Vec<JournalRecord>>,
    fail_next: Mutex<Option<Statement>>,
}

impl InMemoryRowStore {
    /// Create a store with empty tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            counters: Mutex::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Load every table from a dataset.
    ///
    /// Fails on duplicate object ids or on rows owned by a missing object.
    pub fn from_dataset(dataset: Dataset) -> StoreResult<Self> {
        let mut tables = Tables::default();
        for object in dataset.objects {
            if tables.objects.contains_key(&object.id) {
                return Err(StoreError::DuplicateObject(object.id));
            }
            tables.objects.insert(object.id, object);
        }
        for entry in dataset.meta {
            if !tables.objects.contains_key(&entry.object_id) {
                return Err(StoreError::Constraint(format!(
                    "meta {} owned by missing object {}",
                    entry.meta_id, entry.object_id
                )));
            }
            tables.meta.insert(entry.meta_id, entry);
        }
        for tt in dataset.term_taxonomies {
            tables.term_taxonomies.insert(tt.term_taxonomy_id, tt);
        }
        for rel in dataset.term_relationships {
            if !tables.term_taxonomies.contains_key(&rel.term_taxonomy_id) {
                return Err(StoreError::Constraint(format!(
                    "relationship references missing term taxonomy {}",
                    rel.term_taxonomy_id
                )));
            }
            tables.term_relationships.insert(rel);
        }
        for comment in dataset.comments {
            tables.comments.insert(comment.comment_id, comment);
        }
        for entry in dataset.comment_meta {
            tables.comment_meta.insert(entry.meta_id, entry);
        }
        for entry in dataset.retained {
            tables.retained.entry(entry.id).or_insert(entry.object_type);
        }

        let store = Self::new();
        *store.tables.write().map_err(|_| StoreError::LockPoisoned)? = tables;
        Ok(store)
    }

    /// Export every table, including the retain-set.
    pub fn to_dataset(&self) -> StoreResult<Dataset> {
        let t = self.read()?;
        Ok(Dataset {
            objects: t.objects.values().cloned().collect(),
            meta: t.meta.values().cloned().collect(),
            term_taxonomies: t.term_taxonomies.values().cloned().collect(),
            term_relationships: t.term_relationships.iter().copied().collect(),
            comments: t.comments.values().cloned().collect(),
            comment_meta: t.comment_meta.values().cloned().collect(),
            retained: t
                .retained
                .iter()
                .map(|(id, ty)| RetainedEntry::new(*id, ty.clone()))
                .collect(),
        })
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    pub fn object(&self, id: ObjectId) -> StoreResult<Option<Object>> {
        Ok(self.read()?.objects.get(&id).cloned())
    }

    pub fn contains(&self, id: ObjectId) -> StoreResult<bool> {
        Ok(self.read()?.objects.contains_key(&id))
    }

    pub fn object_ids(&self) -> StoreResult<Vec<ObjectId>> {
        Ok(self.read()?.objects.keys().copied().collect())
    }

    pub fn meta_for(&self, id: ObjectId) -> StoreResult<Vec<MetaEntry>> {
        Ok(self
            .read()?
            .meta
            .values()
            .filter(|m| m.object_id == id)
            .cloned()
            .collect())
    }

    pub fn comments_for(&self, id: ObjectId) -> StoreResult<Vec<Comment>> {
        Ok(self
            .read()?
            .comments
            .values()
            .filter(|c| c.object_id == id)
            .cloned()
            .collect())
    }

    pub fn comment_meta_for(&self, comment: CommentId) -> StoreResult<Vec<CommentMeta>> {
        Ok(self
            .read()?
            .comment_meta
            .values()
            .filter(|m| m.comment_id == comment)
            .cloned()
            .collect())
    }

    pub fn relationships_for(&self, id: ObjectId) -> StoreResult<Vec<TermRelationship>> {
        Ok(self
            .read()?
            .term_relationships
            .iter()
            .filter(|r| r.object_id == id)
            .copied()
            .collect())
    }

    pub fn retained_ids(&self) -> StoreResult<Vec<ObjectId>> {
        Ok(self.read()?.retained.keys().copied().collect())
    }

    pub fn counts(&self) -> StoreResult<TableCounts> {
        let t = self.read()?;
        Ok(TableCounts {
            objects: t.objects.len(),
            meta: t.meta.len(),
            term_taxonomies: t.term_taxonomies.len(),
            term_relationships: t.term_relationships.len(),
            comments: t.comments.len(),
            comment_meta: t.comment_meta.len(),
            retained: t.retained.len(),
        })
    }

    // ---------------------------------------------------------------
    // Instrumentation
    // ---------------------------------------------------------------

    /// How many statements of `kind` have executed.
    pub fn statement_count(&self, kind: Statement) -> u64 {
        self.counters
            .lock()
            .map(|c| c.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Object-keyed writes in execution order.
    pub fn journal(&self) -> Vec<JournalRecord> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// Reset statement counters and the journal.
    pub fn reset_instrumentation(&self) {
        if let Ok(mut c) = self.counters.lock() {
            c.clear();
        }
        if let Ok(mut j) = self.journal.lock() {
            j.clear();
        }
    }

    /// Make the next statement of `kind` fail.
    pub fn fail_next(&self, kind: Statement) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(kind);
        }
    }

    fn begin(&self, kind: Statement) -> StoreResult<()> {
        if let Ok(mut slot) = self.fail_next.lock() {
            if *slot == Some(kind) {
                *slot = None;
                return Err(StoreError::Statement {
                    statement: format!("{kind:?}"),
                    reason: "injected failure".into(),
                });
            }
        }
        if let Ok(mut c) = self.counters.lock() {
            *c.entry(kind).or_insert(0) += 1;
        }
        Ok(())
    }

    fn record(&self, statement: Statement, ids: &[ObjectId]) {
        if let Ok(mut j) = self.journal.lock() {
            j.push(JournalRecord {
                statement,
                ids: ids.to_vec(),
            });
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = self.counts().unwrap_or_default();
        f.debug_struct("InMemoryRowStore")
            .field("objects", &counts.objects)
            .field("retained", &counts.retained)
            .finish()
    }
}

impl RowStore for InMemoryRowStore {
    fn count_objects(&self, exclude_types: &[ObjectType]) -> StoreResult<u64> {
        self.begin(Statement::CountObjects)?;
        let t = self.read()?;
        Ok(t.objects
            .values()
            .filter(|o| !exclude_types.contains(&o.object_type))
            .count() as u64)
    }

    fn select_ids(
        &self,
        filter: &ObjectFilter,
        after: Option<ObjectId>,
        limit: usize,
    ) -> StoreResult<Vec<ObjectId>> {
        self.begin(Statement::SelectIds)?;
        if limit == 0 {
            return Err(StoreError::InvalidQuery("limit must be positive".into()));
        }
        let t = self.read()?;
        let start = after
            .map(|a| ObjectId::new(a.get().saturating_add(1)))
            .unwrap_or(ObjectId::new(0));
        Ok(t.objects
            .range(start..)
            .map(|(_, o)| o)
            .filter(|o| filter.matches_row(o))
            .filter(|o| !filter.retained_only || t.retained.contains_key(&o.id))
            .filter(|o| t.meta_matches(o.id, filter))
            .take(limit)
            .map(|o| o.id)
            .collect())
    }

    fn fetch_objects(&self, ids: &[ObjectId]) -> StoreResult<Vec<Object>> {
        self.begin(Statement::FetchObjects)?;
        let t = self.read()?;
        let unique: BTreeSet<&ObjectId> = ids.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| t.objects.get(id).cloned())
            .collect())
    }

    fn fetch_meta(&self, ids: &[ObjectId], key: &str) -> StoreResult<Vec<MetaEntry>> {
        self.begin(Statement::FetchMeta)?;
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let t = self.read()?;
        Ok(t.meta
            .values()
            .filter(|m| m.key == key && wanted.contains(&m.object_id))
            .cloned()
            .collect())
    }

    fn select_children(
        &self,
        parent_ids: &[ObjectId],
        types: &[ObjectType],
    ) -> StoreResult<Vec<Object>> {
        self.begin(Statement::SelectChildren)?;
        let parents: BTreeSet<&ObjectId> = parent_ids.iter().collect();
        let t = self.read()?;
        Ok(t.objects
            .values()
            .filter(|o| o.parent_id.is_some_and(|p| parents.contains(&p)))
            .filter(|o| types.contains(&o.object_type))
            .cloned()
            .collect())
    }

    fn object_taxonomies(&self, ids: &[ObjectId]) -> StoreResult<BTreeSet<String>> {
        self.begin(Statement::ObjectTaxonomies)?;
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let t = self.read()?;
        Ok(t.term_relationships
            .iter()
            .filter(|r| wanted.contains(&r.object_id))
            .filter_map(|r| t.term_taxonomies.get(&r.term_taxonomy_id))
            .map(|tt| tt.taxonomy.clone())
            .collect())
    }

    fn delete_term_relationships(
        &self,
        ids: &[ObjectId],
        taxonomies: &[String],
    ) -> StoreResult<u64> {
        self.begin(Statement::DeleteTermRelationships)?;
        self.record(Statement::DeleteTermRelationships, ids);
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let mut t = self.write()?;
        let Tables {
            term_relationships,
            term_taxonomies,
            ..
        } = &mut *t;
        let before = term_relationships.len();
        term_relationships.retain(|r| {
            let joined = term_taxonomies
                .get(&r.term_taxonomy_id)
                .is_some_and(|tt| taxonomies.contains(&tt.taxonomy));
            !(joined && wanted.contains(&r.object_id))
        });
        Ok((before - term_relationships.len()) as u64)
    }

    fn comment_ids_for(&self, ids: &[ObjectId]) -> StoreResult<Vec<CommentId>> {
        self.begin(Statement::CommentIdsFor)?;
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let t = self.read()?;
        Ok(t.comments
            .values()
            .filter(|c| wanted.contains(&c.object_id))
            .map(|c| c.comment_id)
            .collect())
    }

    fn delete_comment_meta(&self, comment_ids: &[CommentId]) -> StoreResult<u64> {
        self.begin(Statement::DeleteCommentMeta)?;
        let wanted: BTreeSet<&CommentId> = comment_ids.iter().collect();
        let mut t = self.write()?;
        let before = t.comment_meta.len();
        t.comment_meta.retain(|_, m| !wanted.contains(&m.comment_id));
        Ok((before - t.comment_meta.len()) as u64)
    }

    fn delete_comments_for(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        self.begin(Statement::DeleteComments)?;
        self.record(Statement::DeleteComments, ids);
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let mut t = self.write()?;
        let before = t.comments.len();
        t.comments.retain(|_, c| !wanted.contains(&c.object_id));
        Ok((before - t.comments.len()) as u64)
    }

    fn delete_meta(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        self.begin(Statement::DeleteMeta)?;
        self.record(Statement::DeleteMeta, ids);
        let wanted: BTreeSet<&ObjectId> = ids.iter().collect();
        let mut t = self.write()?;
        let before = t.meta.len();
        t.meta.retain(|_, m| !wanted.contains(&m.object_id));
        Ok((before - t.meta.len()) as u64)
    }

    fn anonymize_comments(&self, email: &str) -> StoreResult<u64> {
        self.begin(Statement::AnonymizeComments)?;
        let mut t = self.write()?;
        let mut touched = 0;
        for comment in t.comments.values_mut() {
            comment.author_email = email.to_string();
            comment.author_ip.clear();
            comment.agent.clear();
            touched += 1;
        }
        Ok(touched)
    }

    fn reparent(&self, ids: &[ObjectId], new_parent: ObjectId) -> StoreResult<u64> {
        self.begin(Statement::Reparent)?;
        self.record(Statement::Reparent, ids);
        let mut t = self.write()?;
        let mut updated = 0;
        for id in ids {
            if let Some(object) = t.objects.get_mut(id) {
                object.parent_id = Some(new_parent);
                updated += 1;
            }
        }
        debug!(count = updated, parent = %new_parent, "reparented objects");
        Ok(updated)
    }

    fn delete_objects(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        self.begin(Statement::DeleteObjects)?;
        self.record(Statement::DeleteObjects, ids);
        let mut t = self.write()?;
        let mut removed = 0;
        for id in ids {
            if t.objects.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn reset_retain_set(&self) -> StoreResult<()> {
        self.begin(Statement::ResetRetainSet)?;
        self.write()?.retained.clear();
        Ok(())
    }

    fn insert_retained(&self, entries: &[RetainedEntry]) -> StoreResult<u64> {
        self.begin(Statement::InsertRetained)?;
        let mut t = self.write()?;
        let mut inserted = 0;
        for entry in entries {
            if !t.retained.contains_key(&entry.id) {
                t.retained.insert(entry.id, entry.object_type.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn retained_count(&self) -> StoreResult<u64> {
        self.begin(Statement::RetainedCount)?;
        Ok(self.read()?.retained.len() as u64)
    }

    fn select_unretained(
        &self,
        exclude_types: &[ObjectType],
        limit: usize,
    ) -> StoreResult<Vec<ObjectId>> {
        self.begin(Statement::SelectUnretained)?;
        let t = self.read()?;
        Ok(t.objects
            .values()
            .filter(|o| !t.retained.contains_key(&o.id))
            .filter(|o| !exclude_types.contains(&o.object_type))
            .take(limit)
            .map(|o| o.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DatasetBuilder;
    use crate::query::{MetaCondition, TypeSelector};

    fn id(n: u64) -> ObjectId {
        ObjectId::new(n)
    }

    fn ty(name: &str) -> ObjectType {
        ObjectType::new(name).unwrap()
    }

    fn sample() -> InMemoryRowStore {
        DatasetBuilder::new()
            .object(1, "post")
            .object(2, "page")
            .child(3, "attachment", 1)
            .child(4, "revision", 1)
            .object(5, "post")
            .meta(1, "_thumbnail_id", "3")
            .meta(5, "_amzn", "a:0:{}")
            .term(1, "category", 10)
            .term(1, "post_tag", 11)
            .term(5, "nav_menu", 12)
            .comment(1, &[("akismet", "spam")])
            .comment(5, &[])
            .build_store()
            .unwrap()
    }

    #[test]
    fn count_objects_excludes_types() {
        let store = sample();
        assert_eq!(store.count_objects(&[]).unwrap(), 5);
        assert_eq!(store.count_objects(&[ObjectType::revision()]).unwrap(), 4);
    }

    #[test]
    fn select_ids_pages_by_keyset() {
        let store = sample();
        let filter = ObjectFilter::for_types(TypeSelector::Any);
        let first = store.select_ids(&filter, None, 2).unwrap();
        assert_eq!(first, vec![id(1), id(2)]);
        let second = store.select_ids(&filter, Some(id(2)), 2).unwrap();
        // Revision 4 is never matched by `Any`.
        assert_eq!(second, vec![id(3), id(5)]);
        let third = store.select_ids(&filter, Some(id(5)), 2).unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn select_ids_rejects_zero_limit() {
        let store = sample();
        let filter = ObjectFilter::for_types(TypeSelector::Any);
        assert!(matches!(
            store.select_ids(&filter, None, 0),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn select_ids_applies_meta_and_retained_conditions() {
        let store = sample();
        let filter = ObjectFilter::for_types(TypeSelector::Types(vec![ty("post")])).meta(
            MetaCondition::NotEquals {
                key: "_amzn".into(),
                value: "a:0:{}".into(),
            },
        );
        assert!(store.select_ids(&filter, None, 10).unwrap().is_empty());

        let posts = ObjectFilter::for_types(TypeSelector::Types(vec![ty("post")])).retained_only();
        assert!(store.select_ids(&posts, None, 10).unwrap().is_empty());
        store
            .insert_retained(&[RetainedEntry::new(id(5), ty("post"))])
            .unwrap();
        assert_eq!(store.select_ids(&posts, None, 10).unwrap(), vec![id(5)]);
    }

    #[test]
    fn fetch_objects_skips_missing_and_duplicates() {
        let store = sample();
        let rows = store.fetch_objects(&[id(5), id(99), id(1), id(5)]).unwrap();
        let ids: Vec<_> = rows.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![id(1), id(5)]);
        assert_eq!(store.statement_count(Statement::FetchObjects), 1);
    }

    #[test]
    fn select_children_filters_by_type() {
        let store = sample();
        let kids = store.select_children(&[id(1)], &[ObjectType::attachment()]).unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, id(3));
        let revs = store.select_children(&[id(1)], &[ObjectType::revision()]).unwrap();
        assert_eq!(revs[0].id, id(4));
    }

    #[test]
    fn taxonomy_join_delete_only_touches_named_taxonomies() {
        let store = sample();
        let taxes = store.object_taxonomies(&[id(1)]).unwrap();
        assert_eq!(taxes.into_iter().collect::<Vec<_>>(), vec!["category", "post_tag"]);

        let removed = store
            .delete_term_relationships(&[id(1), id(5)], &["category".to_string()])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.relationships_for(id(1)).unwrap().len(), 1);
        assert_eq!(store.relationships_for(id(5)).unwrap().len(), 1);
    }

    #[test]
    fn comment_meta_then_comments() {
        let store = sample();
        let comments = store.comment_ids_for(&[id(1)]).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(store.delete_comment_meta(&comments).unwrap(), 1);
        assert_eq!(store.delete_comments_for(&[id(1)]).unwrap(), 1);
        assert!(store.comments_for(id(1)).unwrap().is_empty());
        assert_eq!(store.comments_for(id(5)).unwrap().len(), 1);
    }

    #[test]
    fn reparent_and_delete_are_journaled() {
        let store = sample();
        assert_eq!(store.reparent(&[id(3), id(77)], id(2)).unwrap(), 1);
        assert_eq!(store.object(id(3)).unwrap().unwrap().parent_id, Some(id(2)));
        assert_eq!(store.delete_objects(&[id(1), id(1)]).unwrap(), 1);
        assert_eq!(store.delete_objects(&[id(1)]).unwrap(), 0);

        let journal = store.journal();
        assert_eq!(journal.len(), 3);
        assert_eq!(journal[0].statement, Statement::Reparent);
        assert_eq!(journal[1].ids, vec![id(1), id(1)]);
    }

    #[test]
    fn insert_retained_ignores_duplicates() {
        let store = sample();
        let entry = RetainedEntry::new(id(1), ty("post"));
        assert_eq!(store.insert_retained(&[entry.clone(), entry.clone()]).unwrap(), 1);
        assert_eq!(store.insert_retained(&[entry]).unwrap(), 0);
        assert_eq!(store.retained_count().unwrap(), 1);
        store.reset_retain_set().unwrap();
        assert_eq!(store.retained_count().unwrap(), 0);
    }

    #[test]
    fn select_unretained_is_an_anti_join() {
        let store = sample();
        store
            .insert_retained(&[RetainedEntry::new(id(2), ty("page"))])
            .unwrap();
        let ids = store.select_unretained(&[ObjectType::revision()], 10).unwrap();
        assert_eq!(ids, vec![id(1), id(3), id(5)]);
        let limited = store.select_unretained(&[ObjectType::revision()], 2).unwrap();
        assert_eq!(limited, vec![id(1), id(3)]);
    }

    #[test]
    fn anonymize_comments_clears_pii() {
        let store = sample();
        assert_eq!(store.anonymize_comments("commenter@example.test").unwrap(), 2);
        for comment in store.comments_for(id(1)).unwrap() {
            assert_eq!(comment.author_email, "commenter@example.test");
            assert!(comment.author_ip.is_empty());
            assert!(comment.agent.is_empty());
        }
    }

    #[test]
    fn injected_failure_fires_once() {
        let store = sample();
        store.fail_next(Statement::DeleteMeta);
        assert!(matches!(
            store.delete_meta(&[id(1)]),
            Err(StoreError::Statement { .. })
        ));
        assert_eq!(store.delete_meta(&[id(1)]).unwrap(), 1);
    }

    #[test]
    fn dataset_round_trip_preserves_tables() {
        let store = sample();
        store
            .insert_retained(&[RetainedEntry::new(id(1), ty("post"))])
            .unwrap();
        let again = InMemoryRowStore::from_dataset(store.to_dataset().unwrap()).unwrap();
        assert_eq!(again.counts().unwrap(), store.counts().unwrap());
    }

    #[test]
    fn duplicate_ids_are_rejected_on_load() {
        let mut dataset = DatasetBuilder::new().object(1, "post").build();
        dataset.objects.push(dataset.objects[0].clone());
        assert!(matches!(
            InMemoryRowStore::from_dataset(dataset),
            Err(StoreError::DuplicateObject(_))
        ));
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("InMemoryRowStore"));
        assert!(debug.contains("objects"));
    }
}
