//! Wire events delivered by the change feed.

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationId, AnnotationStatus, Geometry};

/// Kind of remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single mutation observed on the shared backing store.
///
/// Deletes carry only the id; inserts and updates carry the fields the
/// backing store knows about. Colors are intentionally absent: each editor
/// picks its own display color for records it learns about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChange {
    pub kind: RemoteChangeKind,
    pub id: AnnotationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "data")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnnotationStatus>,
}

impl RemoteChange {
    /// Insert event for a stored record.
    pub fn insert(annotation: &Annotation) -> Self {
        Self {
            kind: RemoteChangeKind::Insert,
            id: annotation.id.clone(),
            class_name: Some(annotation.class_name.clone()),
            geometry: Some(annotation.geometry.clone()),
            status: Some(annotation.status),
        }
    }

    /// Update event carrying the record's current fields.
    pub fn update(annotation: &Annotation) -> Self {
        Self {
            kind: RemoteChangeKind::Update,
            ..Self::insert(annotation)
        }
    }

    /// Delete event for an id.
    pub fn delete(id: impl Into<AnnotationId>) -> Self {
        Self {
            kind: RemoteChangeKind::Delete,
            id: id.into(),
            class_name: None,
            geometry: None,
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    #[test]
    fn test_delete_event_omits_payload_fields() {
        let json = serde_json::to_value(RemoteChange::delete("a1")).unwrap();

        assert_eq!(json["kind"], "delete");
        assert_eq!(json["id"], "a1");
        assert!(json.get("data").is_none());
        assert!(json.get("class_name").is_none());
    }

    #[test]
    fn test_insert_event_round_trip() {
        let ann = Annotation {
            id: "ann-3".to_string(),
            geometry: Geometry::BoundingBox(BoundingBox::new(1.0, 2.0, 30.0, 40.0)),
            class_name: "car".to_string(),
            color: "#ef4444".to_string(),
            status: AnnotationStatus::Draft,
            confirm: Default::default(),
        };

        let event = RemoteChange::insert(&ann);
        let json = serde_json::to_string(&event).unwrap();
        let back: RemoteChange = serde_json::from_str(&json).unwrap();

        assert_eq!(back, event);
        assert_eq!(back.kind, RemoteChangeKind::Insert);
        assert_eq!(back.geometry.unwrap().bounding_box().unwrap().width, 30.0);
    }
}
