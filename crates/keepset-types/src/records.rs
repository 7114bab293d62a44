//! Dependent records. Each is owned by exactly one object and only ever
//! removed as a consequence of that object's deletion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// Identifier of a row in the comments table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key/value pair attached to an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub meta_id: u64,
    pub object_id: ObjectId,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// A term under a taxonomy (`category`, `post_tag`, `nav_menu`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermTaxonomy {
    pub term_taxonomy_id: u64,
    pub term_id: u64,
    pub taxonomy: String,
}

/// Join row linking an object to a term taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermRelationship {
    pub object_id: ObjectId,
    pub term_taxonomy_id: u64,
}

/// A comment owned by an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: CommentId,
    pub object_id: ObjectId,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_ip: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub content: String,
}

impl Comment {
    pub fn new(comment_id: CommentId, object_id: ObjectId) -> Self {
        Self {
            comment_id,
            object_id,
            author: String::new(),
            author_email: String::new(),
            author_ip: String::new(),
            agent: String::new(),
            content: String::new(),
        }
    }
}

/// A key/value pair attached to a comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentMeta {
    pub meta_id: u64,
    pub comment_id: CommentId,
    pub key: String,
    #[serde(default)]
    pub value: String,
}
