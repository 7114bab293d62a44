//! Cascading delete of one batch.
//!
//! Objects are deleted together with everything that points at them. The
//! batch and its revisions form levels: level 0 is the batch, level `n + 1`
//! the revisions of level `n`. Relationship cleanup and re-parenting run
//! top-down, then rows are deleted bottom-up so a revision is always gone
//! before its parent.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use serde::Serialize;
use tracing::debug;

use keepset_cache::ObjectCache;
use keepset_store::RowStore;
use keepset_types::{Object, ObjectId, ObjectType};

use crate::config::SweepConfig;
use crate::error::SweepResult;

/// Rows touched by cascading deletes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Batch objects deleted.
    pub objects: u64,
    /// Revisions deleted with them.
    pub revisions: u64,
    pub relationships: u64,
    /// Children moved to their grandparent.
    pub reparented: u64,
    pub comments: u64,
    pub comment_meta: u64,
    pub meta: u64,
}

impl AddAssign for CascadeReport {
    fn add_assign(&mut self, other: Self) {
        self.objects += other.objects;
        self.revisions += other.revisions;
        self.relationships += other.relationships;
        self.reparented += other.reparented;
        self.comments += other.comments;
        self.comment_meta += other.comment_meta;
        self.meta += other.meta;
    }
}

/// Deletes batches of objects with their dependent records.
pub struct Cascade<'a> {
    store: &'a dyn RowStore,
    config: &'a SweepConfig,
}

impl<'a> Cascade<'a> {
    pub fn new(store: &'a dyn RowStore, config: &'a SweepConfig) -> Self {
        Self { store, config }
    }

    /// Delete `ids` and everything depending on them. Ids that no longer
    /// exist are skipped.
    pub fn delete_batch(
        &self,
        ids: &[ObjectId],
        cache: &mut ObjectCache<'_>,
    ) -> SweepResult<CascadeReport> {
        let mut report = CascadeReport::default();
        let batch: Vec<Object> = cache.get_many(ids.iter().copied())?.into_values().collect();
        if batch.is_empty() {
            return Ok(report);
        }

        let mut seen: BTreeSet<ObjectId> = batch.iter().map(|o| o.id).collect();
        let mut levels: Vec<Vec<Object>> = Vec::new();
        let mut level = batch;

        while !level.is_empty() {
            self.unlink(&level, &seen, cache, &mut report)?;

            let ids = id_list(&level);
            let revisions: Vec<Object> = self
                .store
                .select_children(&ids, std::slice::from_ref(&self.config.revision_type))?
                .into_iter()
                .filter(|r| seen.insert(r.id))
                .collect();
            for revision in &revisions {
                cache.put(revision.clone());
            }

            levels.push(level);
            level = revisions;
        }

        for (depth, level) in levels.iter().enumerate().rev() {
            let ids = id_list(level);
            let deleted = self.delete_rows(&ids, &mut report)?;
            if depth == 0 {
                report.objects += deleted;
            } else {
                report.revisions += deleted;
            }
            cache.forget(&ids);
        }

        debug!(
            objects = report.objects,
            revisions = report.revisions,
            reparented = report.reparented,
            "batch deleted"
        );
        Ok(report)
    }

    /// Drop term relationships and move surviving children up one
    /// generation.
    fn unlink(
        &self,
        level: &[Object],
        deleting: &BTreeSet<ObjectId>,
        cache: &mut ObjectCache<'_>,
        report: &mut CascadeReport,
    ) -> SweepResult<()> {
        let ids = id_list(level);

        let mut taxonomies = self.store.object_taxonomies(&ids)?;
        taxonomies.extend(self.config.base_taxonomies.iter().cloned());
        let taxonomies: Vec<String> = taxonomies.into_iter().collect();
        report.relationships += self.store.delete_term_relationships(&ids, &taxonomies)?;

        let types = self.reparent_types(level);
        if types.is_empty() {
            return Ok(());
        }
        let mut by_parent: BTreeMap<ObjectId, Vec<ObjectId>> = BTreeMap::new();
        for child in self.store.select_children(&ids, &types)? {
            if deleting.contains(&child.id) {
                continue;
            }
            if let Some(parent) = child.parent_id {
                by_parent.entry(parent).or_default().push(child.id);
            }
        }
        if by_parent.is_empty() {
            return Ok(());
        }

        let parents: BTreeMap<ObjectId, ObjectId> = level
            .iter()
            .filter(|o| by_parent.contains_key(&o.id))
            .filter_map(|o| o.parent_id.map(|g| (o.id, g)))
            .collect();
        let alive = cache.get_many(parents.values().copied())?;

        for (parent, children) in &by_parent {
            let Some(grandparent) = parents.get(parent) else {
                continue;
            };
            if !alive.contains_key(grandparent) {
                debug!(parent = %parent, grandparent = %grandparent, "grandparent missing; children left in place");
                continue;
            }
            report.reparented += self.store.reparent(children, *grandparent)?;
        }
        Ok(())
    }

    /// Batch types plus configured extras, never the revision type.
    fn reparent_types(&self, level: &[Object]) -> Vec<ObjectType> {
        let mut types: BTreeSet<ObjectType> = self.config.reparent_types.iter().cloned().collect();
        types.extend(level.iter().map(|o| o.object_type.clone()));
        types.remove(&self.config.revision_type);
        types.into_iter().collect()
    }

    /// Comment meta, comments, meta, then the object rows.
    fn delete_rows(&self, ids: &[ObjectId], report: &mut CascadeReport) -> SweepResult<u64> {
        let comment_ids = self.store.comment_ids_for(ids)?;
        if !comment_ids.is_empty() {
            report.comment_meta += self.store.delete_comment_meta(&comment_ids)?;
            report.comments += self.store.delete_comments_for(ids)?;
        }
        report.meta += self.store.delete_meta(ids)?;
        Ok(self.store.delete_objects(ids)?)
    }
}

fn id_list(objects: &[Object]) -> Vec<ObjectId> {
    objects.iter().map(|o| o.id).collect()
}
