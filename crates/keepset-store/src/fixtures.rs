//! Builders for test and demo datasets.

use chrono::{DateTime, TimeZone, Utc};

use keepset_types::{
    Comment, CommentId, CommentMeta, MetaEntry, Object, ObjectId, ObjectType, RetainedEntry,
    TermRelationship, TermTaxonomy,
};

use crate::dataset::Dataset;
use crate::error::StoreResult;
use crate::memory::InMemoryRowStore;

/// Publication time given to objects added without an explicit date.
pub fn default_published_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Fluent builder for a [`Dataset`]. Meta, comment and comment-meta ids are
/// assigned automatically.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    dataset: Dataset,
    next_meta: u64,
    next_comment: u64,
    next_comment_meta: u64,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully specified object.
    pub fn with(mut self, object: Object) -> Self {
        self.dataset.objects.push(object);
        self
    }

    /// Add a top-level object.
    pub fn object(self, id: u64, object_type: &str) -> Self {
        self.object_at(id, object_type, default_published_at())
    }

    /// Add a top-level object published at `at`.
    pub fn object_at(self, id: u64, object_type: &str, at: DateTime<Utc>) -> Self {
        let object = Object::new(ObjectId::new(id), parse_type(object_type), at);
        self.with(object)
    }

    /// Add an object whose parent is `parent`.
    pub fn child(self, id: u64, object_type: &str, parent: u64) -> Self {
        let object = Object::new(ObjectId::new(id), parse_type(object_type), default_published_at())
            .with_parent(ObjectId::new(parent));
        self.with(object)
    }

    /// Set the content of an already added object.
    pub fn content(mut self, id: u64, content: &str) -> Self {
        if let Some(object) = self
            .dataset
            .objects
            .iter_mut()
            .find(|o| o.id == ObjectId::new(id))
        {
            object.content = content.to_string();
        }
        self
    }

    pub fn meta(mut self, object_id: u64, key: &str, value: &str) -> Self {
        self.next_meta += 1;
        self.dataset.meta.push(MetaEntry {
            meta_id: self.next_meta,
            object_id: ObjectId::new(object_id),
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Link an object to a term taxonomy, creating the taxonomy row on first
    /// use.
    pub fn term(mut self, object_id: u64, taxonomy: &str, term_taxonomy_id: u64) -> Self {
        if !self
            .dataset
            .term_taxonomies
            .iter()
            .any(|tt| tt.term_taxonomy_id == term_taxonomy_id)
        {
            self.dataset.term_taxonomies.push(TermTaxonomy {
                term_taxonomy_id,
                term_id: term_taxonomy_id,
                taxonomy: taxonomy.to_string(),
            });
        }
        self.dataset.term_relationships.push(TermRelationship {
            object_id: ObjectId::new(object_id),
            term_taxonomy_id,
        });
        self
    }

    /// Add a comment on `object_id` carrying the given comment meta.
    pub fn comment(mut self, object_id: u64, meta: &[(&str, &str)]) -> Self {
        self.next_comment += 1;
        let comment_id = CommentId(self.next_comment);
        let mut comment = Comment::new(comment_id, ObjectId::new(object_id));
        comment.author_email = format!("reader{}@example.com", self.next_comment);
        comment.author_ip = "203.0.113.7".to_string();
        comment.agent = "Mozilla/5.0".to_string();
        self.dataset.comments.push(comment);
        for (key, value) in meta {
            self.next_comment_meta += 1;
            self.dataset.comment_meta.push(CommentMeta {
                meta_id: self.next_comment_meta,
                comment_id,
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    /// Pre-populate the retain-set.
    pub fn retained(mut self, id: u64, object_type: &str) -> Self {
        self.dataset
            .retained
            .push(RetainedEntry::new(ObjectId::new(id), parse_type(object_type)));
        self
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }

    pub fn build_store(self) -> StoreResult<InMemoryRowStore> {
        InMemoryRowStore::from_dataset(self.dataset)
    }
}

/// Panics on an empty type name; fixtures are always written by hand.
fn parse_type(name: &str) -> ObjectType {
    ObjectType::new(name).expect("fixture object type must not be empty")
}
