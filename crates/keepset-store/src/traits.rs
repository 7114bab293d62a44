use std::collections::BTreeSet;

use keepset_types::{CommentId, MetaEntry, Object, ObjectId, ObjectType, RetainedEntry};

use crate::error::StoreResult;
use crate::query::ObjectFilter;

/// The relational row store being pruned.
///
/// Every method is one statement: the backend executes it atomically, but
/// no transaction ever spans two calls. Implementations must satisfy these
/// invariants:
/// - Id-returning selects are ordered by id ascending.
/// - Batched reads return only rows that exist; missing ids are skipped.
/// - `insert_retained` ignores duplicates instead of failing.
/// - Deletes of rows that are already gone succeed and count zero.
pub trait RowStore: Send + Sync {
    // ---------------------------------------------------------------
    // Object reads
    // ---------------------------------------------------------------

    /// Count objects whose type is not in `exclude_types`.
    fn count_objects(&self, exclude_types: &[ObjectType]) -> StoreResult<u64>;

    /// Select up to `limit` ids matching `filter` with id greater than
    /// `after`, ascending.
    fn select_ids(
        &self,
        filter: &ObjectFilter,
        after: Option<ObjectId>,
        limit: usize,
    ) -> StoreResult<Vec<ObjectId>>;

    /// Read full rows for a batch of ids.
    fn fetch_objects(&self, ids: &[ObjectId]) -> StoreResult<Vec<Object>>;

    /// Read one row.
    ///
    /// Default implementation issues a one-element batch read.
    fn fetch_object(&self, id: ObjectId) -> StoreResult<Option<Object>> {
        Ok(self.fetch_objects(&[id])?.into_iter().next())
    }

    /// Read the meta entries with `key` for a batch of objects.
    fn fetch_meta(&self, ids: &[ObjectId], key: &str) -> StoreResult<Vec<MetaEntry>>;

    /// Children of `parent_ids` whose type is one of `types`.
    fn select_children(
        &self,
        parent_ids: &[ObjectId],
        types: &[ObjectType],
    ) -> StoreResult<Vec<Object>>;

    // ---------------------------------------------------------------
    // Dependent records
    // ---------------------------------------------------------------

    /// Distinct taxonomies of the terms linked to any of `ids`.
    fn object_taxonomies(&self, ids: &[ObjectId]) -> StoreResult<BTreeSet<String>>;

    /// Delete relationship rows joining `ids` to terms under `taxonomies`.
    fn delete_term_relationships(
        &self,
        ids: &[ObjectId],
        taxonomies: &[String],
    ) -> StoreResult<u64>;

    /// Ids of the comments owned by `ids`.
    fn comment_ids_for(&self, ids: &[ObjectId]) -> StoreResult<Vec<CommentId>>;

    /// Delete the meta entries of the given comments.
    fn delete_comment_meta(&self, comment_ids: &[CommentId]) -> StoreResult<u64>;

    /// Delete every comment owned by `ids`.
    fn delete_comments_for(&self, ids: &[ObjectId]) -> StoreResult<u64>;

    /// Delete every meta entry owned by `ids`.
    fn delete_meta(&self, ids: &[ObjectId]) -> StoreResult<u64>;

    /// Rewrite author email, IP and agent on every comment.
    fn anonymize_comments(&self, email: &str) -> StoreResult<u64>;

    // ---------------------------------------------------------------
    // Object writes
    // ---------------------------------------------------------------

    /// Point every object in `ids` at `new_parent`.
    fn reparent(&self, ids: &[ObjectId], new_parent: ObjectId) -> StoreResult<u64>;

    /// Delete object rows.
    fn delete_objects(&self, ids: &[ObjectId]) -> StoreResult<u64>;

    // ---------------------------------------------------------------
    // Retain-set table
    // ---------------------------------------------------------------

    /// Create the retain-set if missing and truncate it.
    fn reset_retain_set(&self) -> StoreResult<()>;

    /// Insert entries, ignoring ids already present. Returns the number of
    /// entries actually added.
    fn insert_retained(&self, entries: &[RetainedEntry]) -> StoreResult<u64>;

    /// Number of entries in the retain-set.
    fn retained_count(&self) -> StoreResult<u64>;

    /// Anti-join: up to `limit` object ids, ascending, that are absent from
    /// the retain-set and whose type is not in `exclude_types`.
    fn select_unretained(
        &self,
        exclude_types: &[ObjectType],
        limit: usize,
    ) -> StoreResult<Vec<ObjectId>>;
}
