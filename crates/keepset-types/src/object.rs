use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a row in the object table.
///
/// Ids are assigned by the store in increasing order, so ordering by id is
/// ordering by insertion. Zero is never a valid id; stores use it as the
/// "no object" sentinel in pointer columns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parse an id stored as text in a pointer field (meta values, block
    /// attributes).
    ///
    /// Returns `None` for empty strings, non-numeric text and the zero
    /// sentinel, all of which mean "points at nothing".
    pub fn parse_pointer(raw: &str) -> Option<Self> {
        match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(Self(n)),
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_pointer(s).ok_or_else(|| TypeError::InvalidObjectId(s.to_string()))
    }
}

impl From<u64> for ObjectId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Type discriminator of an object (`post`, `page`, `attachment`,
/// `revision`, `nav_menu_item`, ...).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectType(String);

impl ObjectType {
    pub const REVISION: &'static str = "revision";
    pub const ATTACHMENT: &'static str = "attachment";

    /// Create a type discriminator. Fails on an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::EmptyObjectType);
        }
        Ok(Self(name))
    }

    /// The `revision` type.
    pub fn revision() -> Self {
        Self(Self::REVISION.to_string())
    }

    /// The `attachment` type.
    pub fn attachment() -> Self {
        Self(Self::ATTACHMENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_revision(&self) -> bool {
        self.0 == Self::REVISION
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectType({})", self.0)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectType> for String {
    fn from(value: ObjectType) -> Self {
        value.0
    }
}

impl PartialEq<str> for ObjectType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ObjectType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Publication status of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
    Inherit,
    AutoDraft,
}

impl ObjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
            Self::Trash => "trash",
            Self::Inherit => "inherit",
            Self::AutoDraft => "auto-draft",
        }
    }
}

impl FromStr for ObjectStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(Self::Publish),
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "private" => Ok(Self::Private),
            "future" => Ok(Self::Future),
            "trash" => Ok(Self::Trash),
            "inherit" => Ok(Self::Inherit),
            "auto-draft" => Ok(Self::AutoDraft),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the object table.
///
/// Objects form a forest through `parent_id`. A `revision` is always the
/// child of exactly one non-revision object and never a root on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub object_type: ObjectType,
    #[serde(default)]
    pub parent_id: Option<ObjectId>,
    #[serde(default)]
    pub title: String,
    /// Opaque payload; may embed references to other objects.
    #[serde(default)]
    pub content: String,
    pub status: ObjectStatus,
    pub published_at: DateTime<Utc>,
}

impl Object {
    /// Create a published, top-level object with empty content.
    pub fn new(id: ObjectId, object_type: ObjectType, published_at: DateTime<Utc>) -> Self {
        Self {
            id,
            object_type,
            parent_id: None,
            title: String::new(),
            content: String::new(),
            status: ObjectStatus::Publish,
            published_at,
        }
    }

    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_status(mut self, status: ObjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_revision(&self) -> bool {
        self.object_type.is_revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_pointer_rejects_sentinels() {
        assert_eq!(ObjectId::parse_pointer("42"), Some(ObjectId::new(42)));
        assert_eq!(ObjectId::parse_pointer(" 7 "), Some(ObjectId::new(7)));
        assert_eq!(ObjectId::parse_pointer("0"), None);
        assert_eq!(ObjectId::parse_pointer(""), None);
        assert_eq!(ObjectId::parse_pointer("custom"), None);
        assert_eq!(ObjectId::parse_pointer("-3"), None);
    }

    #[test]
    fn from_str_reports_bad_input() {
        assert_eq!("12".parse::<ObjectId>().unwrap(), ObjectId::new(12));
        assert_eq!(
            "x".parse::<ObjectId>(),
            Err(TypeError::InvalidObjectId("x".into()))
        );
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(ObjectId::new(3) < ObjectId::new(10));
    }

    #[test]
    fn empty_object_type_is_rejected() {
        assert_eq!(ObjectType::new("  "), Err(TypeError::EmptyObjectType));
        assert!(serde_json::from_str::<ObjectType>("\"\"").is_err());
    }

    #[test]
    fn object_type_compares_with_str() {
        let t = ObjectType::new("post").unwrap();
        assert_eq!(t, "post");
        assert!(ObjectType::revision().is_revision());
        assert!(!t.is_revision());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ObjectStatus::AutoDraft).unwrap();
        assert_eq!(json, "\"auto-draft\"");
        assert_eq!("auto-draft".parse::<ObjectStatus>().unwrap(), ObjectStatus::AutoDraft);
        assert!("bogus".parse::<ObjectStatus>().is_err());
    }

    #[test]
    fn object_deserializes_with_defaults() {
        let json = r#"{
            "id": 5,
            "object_type": "post",
            "status": "publish",
            "published_at": "2024-01-02T03:04:05Z"
        }"#;
        let obj: Object = serde_json::from_str(json).unwrap();
        assert_eq!(obj.id, ObjectId::new(5));
        assert!(obj.parent_id.is_none());
        assert!(obj.content.is_empty());
        assert_eq!(
            obj.published_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }
}
