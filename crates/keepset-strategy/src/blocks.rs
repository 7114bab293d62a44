//! Object references embedded in block markup.
//!
//! Content can embed other objects through block comments such as
//! `<!-- wp:image {"id":42} /-->` or
//! `<!-- wp:gallery {"ids":[7,8]} -->`. The extractor pulls those ids out so
//! the marker can retain what retained content displays.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use keepset_types::{Object, ObjectId};

/// Attribute keys holding object ids by default.
pub const DEFAULT_REF_KEYS: [&str; 5] = ["id", "ids", "mediaId", "postId", "ref"];

const BLOCK_MARKER: &str = "<!-- wp:";

fn block_comment() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--\s+wp:([a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?)\s+(\{.*?\})\s+/?-->")
            .expect("block comment pattern is a valid literal")
    })
}

/// Collects object ids from block attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedRefExtractor {
    keys: Vec<String>,
}

impl Default for EmbeddedRefExtractor {
    fn default() -> Self {
        Self::with_keys(DEFAULT_REF_KEYS)
    }
}

impl EmbeddedRefExtractor {
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Ids referenced from one content payload.
    pub fn extract(&self, content: &str) -> BTreeSet<ObjectId> {
        let mut ids = BTreeSet::new();
        if !content.contains(BLOCK_MARKER) {
            return ids;
        }
        for caps in block_comment().captures_iter(content) {
            let (Some(name), Some(attrs)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let attrs: Value = match serde_json::from_str(attrs.as_str()) {
                Ok(v) => v,
                Err(e) => {
                    debug!(block = name.as_str(), error = %e, "skipping block with unparsable attributes");
                    continue;
                }
            };
            for key in &self.keys {
                if let Some(value) = attrs.get(key) {
                    collect_ids(value, &mut ids);
                }
            }
        }
        ids
    }

    /// Ids referenced from any of `objects`, excluding the objects
    /// themselves.
    pub fn extract_all(&self, objects: &[Object]) -> BTreeSet<ObjectId> {
        let mut ids: BTreeSet<ObjectId> = objects
            .iter()
            .flat_map(|o| self.extract(&o.content))
            .collect();
        for object in objects {
            ids.remove(&object.id);
        }
        ids
    }
}

fn collect_ids(value: &Value, out: &mut BTreeSet<ObjectId>) {
    match value {
        Value::Number(n) => {
            if let Some(id) = n.as_u64().filter(|n| *n > 0) {
                out.insert(ObjectId::new(id));
            }
        }
        Value::String(s) => out.extend(ObjectId::parse_pointer(s)),
        Value::Array(items) => {
            for item in items {
                // Nested arrays are not id lists.
                if !item.is_array() {
                    collect_ids(item, out);
                }
            }
        }
        _ => {}
    }
}
