use serde::{Deserialize, Serialize};

use crate::object::{Object, ObjectId, ObjectType};

/// One member of the retain-set.
///
/// The retain-set is unique on `id`; the type is recorded for inspection and
/// reporting only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetainedEntry {
    pub id: ObjectId,
    pub object_type: ObjectType,
}

impl RetainedEntry {
    pub fn new(id: ObjectId, object_type: ObjectType) -> Self {
        Self { id, object_type }
    }
}

impl From<&Object> for RetainedEntry {
    fn from(object: &Object) -> Self {
        Self {
            id: object.id,
            object_type: object.object_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn entry_from_object_copies_id_and_type() {
        let obj = Object::new(ObjectId::new(9), ObjectType::attachment(), Utc::now());
        let entry = RetainedEntry::from(&obj);
        assert_eq!(entry.id, ObjectId::new(9));
        assert_eq!(entry.object_type, "attachment");
    }
}
