//! Data models for the annotation workbench.

mod annotation;
mod classes;
mod image;

pub use annotation::{
    is_temp_id, temp_id, Annotation, AnnotationId, AnnotationStatus, ConfirmState, Geometry,
    KeypointMark, TEMP_ID_PREFIX,
};
pub use classes::ClassSet;
pub use image::{ImageId, ImageRef};
