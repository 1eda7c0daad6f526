//! Persistence seam to the shared backing store.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Annotation, AnnotationId, Geometry, ImageId};

/// Opaque failure from the backing store.
///
/// The core interprets nothing beyond success/failure; the message exists
/// for logging only.
#[derive(Debug, Clone, Error)]
#[error("persistence request failed: {0}")]
pub struct PersistError(pub String);

impl PersistError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Asynchronous create/update/delete calls against the shared store.
///
/// Calls are non-blocking with respect to the editing session: the caller
/// applies its optimistic mutation first and reconciles when the call
/// resolves. Implementations must be shareable across tasks.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Create an annotation. Returns the confirmed record, whose id may
    /// differ from any locally minted temporary id.
    async fn create(
        &self,
        image_id: &ImageId,
        class_name: &str,
        geometry: Geometry,
    ) -> Result<Annotation, PersistError>;

    /// Replace the geometry of an existing annotation.
    async fn update(&self, id: &AnnotationId, geometry: Geometry) -> Result<(), PersistError>;

    /// Delete an annotation.
    async fn delete(&self, id: &AnnotationId) -> Result<(), PersistError>;
}
