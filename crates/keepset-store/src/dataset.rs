//! On-disk dataset format.
//!
//! A [`Dataset`] is a JSON document holding every table the in-memory store
//! understands. It is how the CLI loads a snapshot, prunes it, and writes
//! the smaller copy back out.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use keepset_types::{
    Comment, CommentMeta, MetaEntry, Object, RetainedEntry, TermRelationship, TermTaxonomy,
};

use crate::error::{StoreError, StoreResult};

/// Every table of a store, in plain rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub meta: Vec<MetaEntry>,
    #[serde(default)]
    pub term_taxonomies: Vec<TermTaxonomy>,
    #[serde(default)]
    pub term_relationships: Vec<TermRelationship>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub comment_meta: Vec<CommentMeta>,
    #[serde(default)]
    pub retained: Vec<RetainedEntry>,
}

impl Dataset {
    /// Parse a dataset from JSON text.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a dataset file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the dataset as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}
