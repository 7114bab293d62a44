//! Declarative object filters.
//!
//! An [`ObjectFilter`] is what a root strategy hands to the store: which
//! types, statuses, recency window, free-text and meta conditions an object
//! must satisfy. Ordering (id ascending) and page size are not part of the
//! filter; the caller supplies them per call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keepset_types::{MetaEntry, Object, ObjectStatus, ObjectType};

/// Which object types a filter matches.
///
/// Written as the keyword `"any"` or as a list of type names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TypeSelectorRepr", into = "TypeSelectorRepr")]
pub enum TypeSelector {
    /// Every type except revisions.
    Any,
    /// Only the listed types.
    Types(Vec<ObjectType>),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TypeSelectorRepr {
    Keyword(String),
    List(Vec<ObjectType>),
}

impl TryFrom<TypeSelectorRepr> for TypeSelector {
    type Error = String;

    fn try_from(repr: TypeSelectorRepr) -> Result<Self, Self::Error> {
        match repr {
            TypeSelectorRepr::Keyword(k) if k == "any" => Ok(Self::Any),
            TypeSelectorRepr::Keyword(k) => ObjectType::new(k)
                .map(|t| Self::Types(vec![t]))
                .map_err(|e| e.to_string()),
            TypeSelectorRepr::List(types) if types.is_empty() => {
                Err("type list must not be empty".to_string())
            }
            TypeSelectorRepr::List(types) => Ok(Self::Types(types)),
        }
    }
}

impl From<TypeSelector> for TypeSelectorRepr {
    fn from(selector: TypeSelector) -> Self {
        match selector {
            TypeSelector::Any => Self::Keyword("any".to_string()),
            TypeSelector::Types(types) => Self::List(types),
        }
    }
}

impl TypeSelector {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn matches(&self, object_type: &ObjectType) -> bool {
        match self {
            Self::Any => !object_type.is_revision(),
            Self::Types(types) => types.contains(object_type),
        }
    }
}

/// A condition on an object's meta entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "compare", rename_all = "snake_case")]
pub enum MetaCondition {
    /// At least one entry with this key exists.
    Exists { key: String },
    /// At least one entry with this key exists and its value differs.
    NotEquals { key: String, value: String },
}

impl MetaCondition {
    pub fn key(&self) -> &str {
        match self {
            Self::Exists { key } | Self::NotEquals { key, .. } => key,
        }
    }

    /// Evaluate against all meta entries of one object.
    pub fn matches<'a>(&self, entries: impl IntoIterator<Item = &'a MetaEntry>) -> bool {
        let mut entries = entries.into_iter().filter(|e| e.key == self.key());
        match self {
            Self::Exists { .. } => entries.next().is_some(),
            Self::NotEquals { value, .. } => entries.any(|e| &e.value != value),
        }
    }
}

/// Filter selecting candidate root objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFilter {
    pub types: TypeSelector,
    /// Allowed statuses. Empty means every status except `trash` and
    /// `auto-draft`.
    #[serde(default)]
    pub statuses: Vec<ObjectStatus>,
    /// Only objects published strictly after this instant.
    #[serde(default)]
    pub published_after: Option<DateTime<Utc>>,
    /// Case-insensitive substring match over title and content.
    #[serde(default)]
    pub search: Option<String>,
    /// All conditions must hold.
    #[serde(default)]
    pub meta: Vec<MetaCondition>,
    /// Restrict to ids already present in the retain-set.
    #[serde(default)]
    pub retained_only: bool,
}

impl ObjectFilter {
    /// A filter matching every live object of the given types.
    pub fn for_types(types: TypeSelector) -> Self {
        Self {
            types,
            statuses: Vec::new(),
            published_after: None,
            search: None,
            meta: Vec::new(),
            retained_only: false,
        }
    }

    pub fn published_after(mut self, instant: DateTime<Utc>) -> Self {
        self.published_after = Some(instant);
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn meta(mut self, condition: MetaCondition) -> Self {
        self.meta.push(condition);
        self
    }

    pub fn retained_only(mut self) -> Self {
        self.retained_only = true;
        self
    }

    /// The backfill variant of a primary filter: same selection without the
    /// recency window, restricted to ids already retained.
    pub fn into_backfill(mut self) -> Self {
        self.published_after = None;
        self.retained_only = true;
        self
    }

    /// Evaluate the row-local part of the filter (everything except meta
    /// conditions and retain-set membership, which need other tables).
    pub fn matches_row(&self, object: &Object) -> bool {
        if !self.types.matches(&object.object_type) {
            return false;
        }
        let status_ok = if self.statuses.is_empty() {
            !matches!(object.status, ObjectStatus::Trash | ObjectStatus::AutoDraft)
        } else {
            self.statuses.contains(&object.status)
        };
        if !status_ok {
            return false;
        }
        if let Some(after) = self.published_after {
            if object.published_at <= after {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            if !object.title.to_lowercase().contains(&needle)
                && !object.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
