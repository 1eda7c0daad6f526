//! Annotation workbench: the integration layer.
//!
//! Ties the gesture controller, the per-image store, and the sync
//! reconciler together. Everything runs on one cooperative execution
//! context: gestures mutate the store optimistically and spawn their
//! persistence calls; completions and change-feed events are queued and
//! folded back into the store by [`Workbench::pump`] as discrete
//! operations, in arrival order. Requires a Tokio runtime; persistence
//! calls are spawned onto it.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::controller::{Action, GestureContext, InteractionController, Mode};
use crate::geometry::{BoundingBox, Point};
use crate::keybindings::{Key, KeyBindings};
use crate::model::{Annotation, AnnotationId, ClassSet, Geometry, ImageId, ImageRef};
use crate::remote::{ChangeFeed, PersistError, PersistenceService, RemoteChange, RemoteChangeKind};
use crate::store::AnnotationStore;
use crate::sync::SyncReconciler;

/// Persistence completions routed back to the single writer.
///
/// Each completion is tagged with the image it targets; completions that
/// resolve after the active image changed are dropped rather than applied
/// to a store they no longer belong to.
#[derive(Debug)]
pub enum StoreUpdate {
    CreateConfirmed {
        image_id: ImageId,
        temp_id: AnnotationId,
        annotation: Annotation,
    },
    CreateFailed {
        image_id: ImageId,
        temp_id: AnnotationId,
        error: PersistError,
    },
    UpdateFailed {
        image_id: ImageId,
        id: AnnotationId,
        error: PersistError,
    },
    DeleteFailed {
        image_id: ImageId,
        id: AnnotationId,
        error: PersistError,
    },
}

impl StoreUpdate {
    fn image_id(&self) -> &ImageId {
        match self {
            StoreUpdate::CreateConfirmed { image_id, .. }
            | StoreUpdate::CreateFailed { image_id, .. }
            | StoreUpdate::UpdateFailed { image_id, .. }
            | StoreUpdate::DeleteFailed { image_id, .. } => image_id,
        }
    }
}

/// Editing session over one image at a time.
pub struct Workbench {
    persistence: Arc<dyn PersistenceService>,
    reconciler: SyncReconciler,
    controller: InteractionController,
    bindings: KeyBindings,
    classes: ClassSet,
    mode: Mode,
    image: Option<ImageRef>,
    store: Option<AnnotationStore>,
    updates_tx: mpsc::UnboundedSender<StoreUpdate>,
    updates_rx: mpsc::UnboundedReceiver<StoreUpdate>,
}

impl Workbench {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        feed: Arc<dyn ChangeFeed>,
        classes: ClassSet,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            persistence,
            reconciler: SyncReconciler::new(feed),
            controller: InteractionController::new(),
            bindings: KeyBindings::default(),
            classes,
            mode: Mode::default(),
            image: None,
            store: None,
            updates_tx,
            updates_rx,
        }
    }

    // ------------------------------------------------------------------
    // Image lifecycle
    // ------------------------------------------------------------------

    /// Switch the session to a new image.
    ///
    /// The previous store is discarded, any selection or in-progress
    /// gesture is abandoned, and the change-feed subscription is replaced.
    /// In-flight persistence calls for the old image are not cancelled;
    /// their completions are dropped when they resolve.
    pub fn open_image(&mut self, image: ImageRef) {
        log::info!(
            "opening image {} ({}x{})",
            image.id,
            image.width,
            image.height
        );
        self.controller.reset();
        self.store = Some(AnnotationStore::new(image.id.clone()));
        self.reconciler.watch(&image.id);
        self.image = Some(image);
    }

    /// Tear the session down without opening another image.
    pub fn close_image(&mut self) {
        self.controller.reset();
        self.reconciler.stop();
        self.store = None;
        self.image = None;
    }

    // ------------------------------------------------------------------
    // Accessors for the presentation layer
    // ------------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn store(&self) -> Option<&AnnotationStore> {
        self.store.as_ref()
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    /// Id of the selected annotation, if any.
    pub fn selected_id(&self) -> Option<&AnnotationId> {
        self.controller.selected_id()
    }

    /// Box to render for the in-progress gesture, if any.
    pub fn preview_box(&self) -> Option<BoundingBox> {
        self.controller.preview_box()
    }

    /// Switch the interaction mode. Ignored while a resize gesture is in
    /// progress; an in-progress transform is never interrupted.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.controller.in_transform() {
            log::debug!("mode switch ignored mid-transform");
            return;
        }
        if self.mode != mode {
            log::debug!("mode -> {mode:?}");
            self.mode = mode;
        }
    }

    /// Select an existing class for subsequent draws.
    pub fn select_class(&mut self, name: &str) -> bool {
        self.classes.select(name)
    }

    /// Add a class (duplicate names select the existing entry).
    pub fn add_class(&mut self, name: &str) {
        self.classes.add(name);
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let ctx = GestureContext {
            mode: self.mode,
            selected_class: self.classes.selected().unwrap_or(""),
        };
        let action = self.controller.on_pointer_down(Point::new(x, y), &ctx, store);
        if let Some(action) = action {
            self.apply_action(action);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(action) = self.controller.on_pointer_move(Point::new(x, y)) {
            self.apply_action(action);
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        let ctx = GestureContext {
            mode: self.mode,
            selected_class: self.classes.selected().unwrap_or(""),
        };
        let action = self.controller.on_pointer_up(Point::new(x, y), &ctx);
        if let Some(action) = action {
            self.apply_action(action);
        }
    }

    /// Global key press.
    pub fn key(&mut self, key: Key) {
        if let Some(mode) = self.bindings.mode_for_key(key) {
            self.set_mode(mode);
            return;
        }
        if let Some(action) = self.controller.on_key(key, &self.bindings) {
            self.apply_action(action);
        }
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Fold queued change-feed events and persistence completions into the
    /// store, in arrival order. Non-blocking; call once per frame or after
    /// awaiting.
    pub fn pump(&mut self) {
        for change in self.reconciler.poll() {
            self.apply_remote(change);
        }
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
        }
    }

    fn apply_remote(&mut self, change: RemoteChange) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if change.kind == RemoteChangeKind::Delete {
            self.controller.clear_selection_of(&change.id);
        }
        store.apply_remote(change);
    }

    fn apply_update(&mut self, update: StoreUpdate) {
        let active = self.image.as_ref().map(|i| &i.id);
        if active != Some(update.image_id()) {
            log::debug!(
                "dropping stale completion for inactive image {}",
                update.image_id()
            );
            return;
        }
        let Some(store) = self.store.as_mut() else {
            return;
        };

        match update {
            StoreUpdate::CreateConfirmed {
                temp_id,
                annotation,
                ..
            } => {
                let confirmed_id = annotation.id.clone();
                if store.confirm(&temp_id, annotation) {
                    self.controller.retarget_selection(&temp_id, &confirmed_id);
                    log::debug!("create confirmed: {temp_id} -> {confirmed_id}");
                }
            }
            StoreUpdate::CreateFailed { temp_id, error, .. } => {
                log::warn!("create failed, rolling back {temp_id}: {error}");
                store.roll_back(&temp_id);
                self.controller.clear_selection_of(&temp_id);
            }
            StoreUpdate::UpdateFailed { id, error, .. } => {
                log::warn!("update of {id} failed; local state diverges until the next remote event: {error}");
            }
            StoreUpdate::DeleteFailed { id, error, .. } => {
                log::warn!("delete of {id} failed; local state diverges until the next remote event: {error}");
            }
        }
    }

    // ------------------------------------------------------------------
    // Applying gesture actions
    // ------------------------------------------------------------------

    fn apply_action(&mut self, action: Action) {
        let Some(store) = self.store.as_mut() else {
            return;
        };

        match action {
            Action::Create {
                bbox,
                class_name,
                color,
            } => {
                if class_name.is_empty() {
                    log::warn!("ignoring create: no class selected");
                    return;
                }
                let geometry = Geometry::BoundingBox(bbox);
                let temp_id =
                    store.insert_optimistic(geometry.clone(), class_name.clone(), color);
                let image_id = store.image_id().clone();

                let persistence = Arc::clone(&self.persistence);
                let tx = self.updates_tx.clone();
                tokio::spawn(async move {
                    match persistence.create(&image_id, &class_name, geometry).await {
                        Ok(annotation) => {
                            let _ = tx.send(StoreUpdate::CreateConfirmed {
                                image_id,
                                temp_id,
                                annotation,
                            });
                        }
                        Err(error) => {
                            let _ = tx.send(StoreUpdate::CreateFailed {
                                image_id,
                                temp_id,
                                error,
                            });
                        }
                    }
                });
            }
            Action::Translate { id, dx, dy } => {
                store.translate(&id, dx, dy);
            }
            Action::CommitMove { id } => {
                if let Some(geometry) = store.get(&id).map(|a| a.geometry.clone()) {
                    self.spawn_update(id, geometry);
                }
            }
            Action::Resize { id, bbox } => {
                let geometry = Geometry::BoundingBox(bbox);
                store.update_geometry(&id, geometry.clone());
                self.spawn_update(id, geometry);
            }
            Action::Delete { id } => {
                store.remove(&id);
                let image_id = store.image_id().clone();
                let persistence = Arc::clone(&self.persistence);
                let tx = self.updates_tx.clone();
                tokio::spawn(async move {
                    if let Err(error) = persistence.delete(&id).await {
                        let _ = tx.send(StoreUpdate::DeleteFailed {
                            image_id,
                            id,
                            error,
                        });
                    }
                });
            }
        }
    }

    fn spawn_update(&self, id: AnnotationId, geometry: Geometry) {
        let Some(image_id) = self.image.as_ref().map(|i| i.id.clone()) else {
            return;
        };
        let persistence = Arc::clone(&self.persistence);
        let tx = self.updates_tx.clone();
        tokio::spawn(async move {
            if let Err(error) = persistence.update(&id, geometry).await {
                let _ = tx.send(StoreUpdate::UpdateFailed {
                    image_id,
                    id,
                    error,
                });
            }
        });
    }
}
