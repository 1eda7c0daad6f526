//! VisionFlow annotation core.
//!
//! Interactive bounding-box annotation over images, kept in sync with a
//! shared backing store that other editors mutate concurrently. This crate
//! is the state-machine half of an annotation workbench:
//!
//! - [`geometry`]: pure gesture math (normalization, minimum size, resize transforms)
//! - [`store`]: the per-image annotation set with optimistic mutations
//! - [`controller`]: the finite state machine over pointer and key events
//! - [`sync`]: change-feed subscription lifecycle and event draining
//! - [`workbench`]: the integration layer a presentation shell drives
//!
//! Rendering, transport, and authentication live outside; the core talks
//! to them through the [`remote`] traits and the [`model::ImageRef`]
//! descriptor.

pub mod color;
pub mod controller;
pub mod geometry;
pub mod keybindings;
pub mod model;
pub mod remote;
pub mod store;
pub mod sync;
pub mod workbench;

pub use controller::{Action, GestureContext, GestureState, InteractionController, Mode};
pub use geometry::{BoundingBox, Handle, Point, MIN_BOX_SIZE};
pub use keybindings::{Key, KeyBindings};
pub use model::{
    Annotation, AnnotationId, AnnotationStatus, ClassSet, Geometry, ImageId, ImageRef,
};
pub use remote::{
    ChangeFeed, InMemoryBackend, PersistError, PersistenceService, RemoteChange, RemoteChangeKind,
    Subscription,
};
pub use store::AnnotationStore;
pub use sync::SyncReconciler;
pub use workbench::{StoreUpdate, Workbench};
