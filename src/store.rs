//! In-memory annotation set for the open image.
//!
//! The store is the single rendering source of truth. Local gestures mutate
//! it optimistically before the backend confirms; mutations other editors
//! make arrive through [`AnnotationStore::apply_remote`]. Every mutation is
//! a discrete, synchronous operation: the store is single-writer by
//! cooperative scheduling, and records are kept in insertion order so the
//! render order is stable.

use crate::color::random_color;
use crate::model::{Annotation, AnnotationId, ConfirmState, Geometry, ImageId};
use crate::remote::{RemoteChange, RemoteChangeKind};

/// Annotation set owned by exactly one image.
///
/// Discarded and rebuilt whenever the active image changes; no annotation
/// is ever reused across images.
#[derive(Debug)]
pub struct AnnotationStore {
    image_id: ImageId,
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new(image_id: ImageId) -> Self {
        Self {
            image_id,
            annotations: Vec::new(),
        }
    }

    /// The image this store belongs to.
    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// All annotations in insertion (render) order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    /// Topmost annotation under a point, if any.
    ///
    /// Later records render on top, so the search runs in reverse
    /// insertion order.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.geometry.contains(x, y))
            .map(|a| a.id.clone())
    }

    // ------------------------------------------------------------------
    // Local mutations
    // ------------------------------------------------------------------

    /// Insert an optimistic record and return its temporary id.
    pub fn insert_optimistic(
        &mut self,
        geometry: Geometry,
        class_name: String,
        color: String,
    ) -> AnnotationId {
        let annotation = Annotation::new_optimistic(geometry, class_name, color);
        let id = annotation.id.clone();
        debug_assert!(!self.contains(&id));

        log::debug!("optimistic insert {id} on image {}", self.image_id);
        self.annotations.push(annotation);
        id
    }

    /// Replace an optimistic record with its confirmed counterpart.
    ///
    /// The confirmed record keeps the color picked at creation time. When
    /// the change feed's echo of the insert landed first, the temporary
    /// record is simply dropped in favor of the echoed one. Returns false
    /// if the temporary id is no longer present (already rolled back, or
    /// the image changed underneath the call).
    pub fn confirm(&mut self, temp_id: &str, confirmed: Annotation) -> bool {
        let Some(idx) = self.position(temp_id) else {
            log::debug!("ignoring confirmation for unknown record {temp_id}");
            return false;
        };

        if temp_id != confirmed.id && self.contains(&confirmed.id) {
            log::debug!(
                "feed echo already delivered {}; dropping temporary {temp_id}",
                confirmed.id
            );
            self.annotations.remove(idx);
            return true;
        }

        let color = self.annotations[idx].color.clone();
        self.annotations[idx] = Annotation {
            color,
            confirm: ConfirmState::Confirmed,
            ..confirmed
        };
        true
    }

    /// Remove a failed optimistic record. Idempotent.
    pub fn roll_back(&mut self, temp_id: &str) -> bool {
        match self.position(temp_id) {
            Some(idx) => {
                log::debug!("rolling back optimistic record {temp_id}");
                self.annotations.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replace the geometry of a record, immediately.
    ///
    /// Applied before any persistence call resolves; a later persistence
    /// failure does not undo it.
    pub fn update_geometry(&mut self, id: &str, geometry: Geometry) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.geometry = geometry;
                true
            }
            None => false,
        }
    }

    /// Shift a bounding-box record by a pointer delta.
    ///
    /// No-op for records whose geometry is not a bounding box.
    pub fn translate(&mut self, id: &str, dx: f32, dy: f32) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => match &annotation.geometry {
                Geometry::BoundingBox(b) => {
                    annotation.geometry = Geometry::BoundingBox(b.translated(dx, dy));
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Remove a record, immediately. Not rolled back if persistence fails.
    pub fn remove(&mut self, id: &str) -> Option<Annotation> {
        let idx = self.position(id)?;
        Some(self.annotations.remove(idx))
    }

    // ------------------------------------------------------------------
    // Remote mutations
    // ------------------------------------------------------------------

    /// Fold a change-feed event into the set.
    ///
    /// Last write observed wins: an insert for an id that already exists is
    /// treated as an update of that record (the usual case being the feed's
    /// echo of this editor's own just-confirmed create), an update for an
    /// unknown id is dropped, and a delete for an unknown id is a no-op.
    pub fn apply_remote(&mut self, change: RemoteChange) {
        match change.kind {
            RemoteChangeKind::Insert => {
                if self.contains(&change.id) {
                    log::debug!("insert echo for existing record {}; merging", change.id);
                    self.merge_fields(change);
                    return;
                }
                let Some(geometry) = change.geometry else {
                    log::warn!("dropping remote insert {} without geometry", change.id);
                    return;
                };
                self.annotations.push(Annotation {
                    id: change.id,
                    geometry,
                    class_name: change.class_name.unwrap_or_default(),
                    color: random_color().to_string(),
                    status: change.status.unwrap_or_default(),
                    confirm: ConfirmState::Confirmed,
                });
            }
            RemoteChangeKind::Update => {
                if !self.contains(&change.id) {
                    log::debug!("dropping remote update for unknown record {}", change.id);
                    return;
                }
                self.merge_fields(change);
            }
            RemoteChangeKind::Delete => {
                if self.remove(&change.id).is_some() {
                    log::debug!("removed record {} on remote delete", change.id);
                }
            }
        }
    }

    fn merge_fields(&mut self, change: RemoteChange) {
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == change.id) {
            if let Some(geometry) = change.geometry {
                annotation.geometry = geometry;
            }
            if let Some(class_name) = change.class_name {
                annotation.class_name = class_name;
            }
            if let Some(status) = change.status {
                annotation.status = status;
            }
            annotation.confirm = ConfirmState::Confirmed;
        }
    }
}
