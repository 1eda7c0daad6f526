//! Annotation data model.
//!
//! An annotation ties a geometry to a class label on a single image. Only
//! bounding boxes are produced by the interaction layer; the remaining
//! geometry variants mirror the project types the data model anticipates
//! (polygon, keypoint, classification) and are carried through untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BoundingBox, Point};

/// Unique identifier for an annotation.
///
/// Two id spaces coexist: temporary ids minted locally at optimistic-create
/// time and ids assigned by the backend on confirmation. At most one live
/// annotation carries a given id at any time.
pub type AnnotationId = String;

/// Prefix for locally minted temporary ids.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Mint a fresh temporary id for an optimistic create.
pub fn temp_id() -> AnnotationId {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4())
}

/// Check whether an id is a locally minted temporary id.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Review status of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
}

/// A single keypoint in a keypoint annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointMark {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub label: String,
}

/// Annotation geometry, tagged by annotation type on the wire.
///
/// `BoundingBox` is the only variant the gesture layer creates or edits;
/// the others exist so records authored elsewhere survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    BoundingBox(BoundingBox),
    Polygon { points: Vec<Point> },
    Keypoint { points: Vec<KeypointMark> },
    Classification { classes: Vec<String> },
}

impl Geometry {
    /// The bounding box, if this is a bounding-box geometry.
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match self {
            Geometry::BoundingBox(b) => Some(b),
            _ => None,
        }
    }

    /// Check if a point hits this geometry.
    ///
    /// Only bounding boxes participate in hit testing; other variants are
    /// not editable here and never match.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Geometry::BoundingBox(b) => b.contains(x, y),
            _ => false,
        }
    }
}

/// Confirmation phase of a record relative to the shared backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmState {
    /// Created locally, create call still in flight.
    Optimistic,
    /// Present in the backing store.
    #[default]
    Confirmed,
}

/// A single annotation on the open image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Geometry payload; `data` on the wire.
    #[serde(rename = "data")]
    pub geometry: Geometry,
    pub class_name: String,
    /// Display color, assigned once at creation.
    pub color: String,
    #[serde(default)]
    pub status: AnnotationStatus,
    /// Local-only confirmation phase; records read off the wire are confirmed.
    #[serde(skip)]
    pub confirm: ConfirmState,
}

impl Annotation {
    /// Create an optimistic record with a fresh temporary id.
    pub fn new_optimistic(geometry: Geometry, class_name: String, color: String) -> Self {
        Self {
            id: temp_id(),
            geometry,
            class_name,
            color,
            status: AnnotationStatus::Draft,
            confirm: ConfirmState::Optimistic,
        }
    }

    /// Whether this record still awaits create confirmation.
    pub fn is_optimistic(&self) -> bool {
        self.confirm == ConfirmState::Optimistic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_ids_are_unique_and_prefixed() {
        let a = temp_id();
        let b = temp_id();

        assert_ne!(a, b);
        assert!(is_temp_id(&a));
        assert!(is_temp_id(&b));
        assert!(!is_temp_id("ann-42"));
    }

    #[test]
    fn test_geometry_wire_format() {
        let geometry = Geometry::BoundingBox(BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        let json = serde_json::to_value(&geometry).unwrap();

        assert_eq!(json["type"], "bounding_box");
        assert_eq!(json["x"], 10.0);
        assert_eq!(json["width"], 30.0);

        let back: Geometry = serde_json::from_value(json).unwrap();
        assert_eq!(back, geometry);
    }

    #[test]
    fn test_annotation_wire_format_uses_data_field() {
        let ann = Annotation {
            id: "ann-1".to_string(),
            geometry: Geometry::BoundingBox(BoundingBox::new(1.0, 2.0, 10.0, 10.0)),
            class_name: "car".to_string(),
            color: "#ef4444".to_string(),
            status: AnnotationStatus::Draft,
            confirm: ConfirmState::Confirmed,
        };

        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["data"]["type"], "bounding_box");
        assert_eq!(json["class_name"], "car");
        assert_eq!(json["status"], "draft");
    }

    #[test]
    fn test_deserialized_annotation_is_confirmed() {
        let json = serde_json::json!({
            "id": "ann-7",
            "data": {"type": "bounding_box", "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0},
            "class_name": "person",
            "color": "#3b82f6",
        });

        let ann: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(ann.confirm, ConfirmState::Confirmed);
        assert_eq!(ann.status, AnnotationStatus::Draft);
    }

    #[test]
    fn test_optimistic_annotation_defaults() {
        let ann = Annotation::new_optimistic(
            Geometry::BoundingBox(BoundingBox::new(0.0, 0.0, 20.0, 20.0)),
            "bicycle".to_string(),
            "#10b981".to_string(),
        );

        assert!(ann.is_optimistic());
        assert!(is_temp_id(&ann.id));
        assert_eq!(ann.status, AnnotationStatus::Draft);
    }

    #[test]
    fn test_non_box_geometry_never_hit_tests() {
        let polygon = Geometry::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(50.0, 100.0),
            ],
        };
        assert!(!polygon.contains(50.0, 10.0));
        assert!(polygon.bounding_box().is_none());
    }
}
