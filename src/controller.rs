//! Gesture state machine for the annotation canvas.
//!
//! Pointer and key events are folded through a typed transition function:
//! `(state, event, context) -> (state, action)`. The controller never
//! mutates the store itself: every mutation it wants is returned as an
//! [`Action`] for the caller to apply. It also carries no mode or
//! class-selection state of its own; both arrive in the [`GestureContext`]
//! passed with each gesture.

use crate::color::random_color;
use crate::geometry::{BoundingBox, Handle, Point};
use crate::keybindings::{Key, KeyBindings};
use crate::model::AnnotationId;
use crate::store::AnnotationStore;

/// Hit radius around a resize handle, in image pixels.
pub const HANDLE_HIT_RADIUS: f32 = 8.0;

/// Interaction mode, switched by toolbar action or keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Select, move, and resize existing annotations
    Select,
    /// Draw new bounding boxes
    #[default]
    Draw,
}

/// Body-drag bookkeeping while an annotation is selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Last pointer position the drag was advanced to
    pub last: Point,
    /// Whether the pointer actually moved since the press
    pub moved: bool,
}

/// Controller state. One live gesture at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureState {
    /// Nothing selected, no gesture in progress.
    Idle,
    /// Draw gesture in progress; the raw box spans anchor -> current.
    Drawing { anchor: Point, current: Point },
    /// An annotation is selected; `drag` is set while its body is dragged.
    Selected {
        id: AnnotationId,
        drag: Option<Drag>,
    },
    /// A resize handle of the selected annotation is being dragged.
    Transforming {
        id: AnnotationId,
        original: BoundingBox,
        handle: Handle,
        scale_x: f32,
        scale_y: f32,
    },
}

/// Store mutations requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create a new bounding-box annotation from a completed draw gesture.
    Create {
        bbox: BoundingBox,
        class_name: String,
        color: String,
    },
    /// Shift an annotation by a pointer delta. Local-only while the drag
    /// is in progress; a `CommitMove` follows on release.
    Translate {
        id: AnnotationId,
        dx: f32,
        dy: f32,
    },
    /// Persist the geometry reached by a completed move gesture.
    CommitMove { id: AnnotationId },
    /// Replace the geometry after a completed resize gesture and persist it.
    Resize { id: AnnotationId, bbox: BoundingBox },
    /// Delete an annotation.
    Delete { id: AnnotationId },
}

/// Per-gesture context passed in by the caller.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub mode: Mode,
    pub selected_class: &'a str,
}

/// Finite state machine translating gestures into store mutations.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: GestureState,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState::Idle
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Id of the selected annotation, if any (including mid-transform).
    pub fn selected_id(&self) -> Option<&AnnotationId> {
        match &self.state {
            GestureState::Selected { id, .. } | GestureState::Transforming { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether a resize gesture is in progress.
    ///
    /// Mode switches are refused while this holds: an in-progress
    /// transform is never interrupted by a mode key.
    pub fn in_transform(&self) -> bool {
        matches!(self.state, GestureState::Transforming { .. })
    }

    /// The box to render for the in-progress gesture, if any: the raw
    /// drag rectangle while drawing, or the scaled box mid-resize.
    pub fn preview_box(&self) -> Option<BoundingBox> {
        match &self.state {
            GestureState::Drawing { anchor, current } => {
                Some(BoundingBox::from_drag(*anchor, *current))
            }
            GestureState::Transforming {
                original,
                handle,
                scale_x,
                scale_y,
                ..
            } => Some(anchored_resize(original, *handle, *scale_x, *scale_y)),
            _ => None,
        }
    }

    /// Clear any selection and abandon the in-progress gesture.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Drop the selection if it references `id`.
    ///
    /// Called when a remote delete removes the selected record so the
    /// selection never dangles.
    pub fn clear_selection_of(&mut self, id: &str) {
        if self.selected_id().map(|s| s.as_str()) == Some(id) {
            log::debug!("clearing selection of removed record {id}");
            self.state = GestureState::Idle;
        }
    }

    /// Re-point the selection after an optimistic id was confirmed.
    pub fn retarget_selection(&mut self, from: &str, to: &AnnotationId) {
        match &mut self.state {
            GestureState::Selected { id, .. } | GestureState::Transforming { id, .. }
                if id.as_str() == from =>
            {
                *id = to.clone();
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Pointer pressed at `p`.
    pub fn on_pointer_down(
        &mut self,
        p: Point,
        ctx: &GestureContext<'_>,
        store: &AnnotationStore,
    ) -> Option<Action> {
        match ctx.mode {
            Mode::Draw => {
                if self.in_transform() {
                    return None;
                }
                // Starting a draw implicitly deselects
                self.state = GestureState::Drawing {
                    anchor: p,
                    current: p,
                };
                None
            }
            Mode::Select => {
                // A press on a handle of the selected annotation starts a resize
                if let GestureState::Selected { id, .. } = &self.state {
                    let grabbed = store
                        .get(id)
                        .and_then(|a| a.geometry.bounding_box())
                        .and_then(|b| {
                            b.handle_at(p.x, p.y, HANDLE_HIT_RADIUS)
                                .map(|handle| (*b, handle))
                        });
                    if let Some((original, handle)) = grabbed {
                        let id = id.clone();
                        log::debug!("starting resize of {id} at {handle:?}");
                        self.state = GestureState::Transforming {
                            id,
                            original,
                            handle,
                            scale_x: 1.0,
                            scale_y: 1.0,
                        };
                        return None;
                    }
                }

                match store.hit_test(p.x, p.y) {
                    Some(id) => {
                        log::debug!("selected {id}");
                        self.state = GestureState::Selected {
                            id,
                            drag: Some(Drag {
                                last: p,
                                moved: false,
                            }),
                        };
                    }
                    None => {
                        // Empty canvas: deselect
                        self.state = GestureState::Idle;
                    }
                }
                None
            }
        }
    }

    /// Pointer moved to `p` with the button held.
    pub fn on_pointer_move(&mut self, p: Point) -> Option<Action> {
        match &mut self.state {
            GestureState::Drawing { current, .. } => {
                *current = p;
                None
            }
            GestureState::Selected {
                id,
                drag: Some(drag),
            } => {
                let dx = p.x - drag.last.x;
                let dy = p.y - drag.last.y;
                if dx == 0.0 && dy == 0.0 {
                    return None;
                }
                drag.last = p;
                drag.moved = true;
                Some(Action::Translate {
                    id: id.clone(),
                    dx,
                    dy,
                })
            }
            GestureState::Transforming {
                original,
                handle,
                scale_x,
                scale_y,
                ..
            } => {
                let (sx, sy) = scale_for(original, *handle, p);
                *scale_x = sx;
                *scale_y = sy;
                None
            }
            _ => None,
        }
    }

    /// Pointer released at `p`.
    pub fn on_pointer_up(&mut self, p: Point, ctx: &GestureContext<'_>) -> Option<Action> {
        match std::mem::take(&mut self.state) {
            GestureState::Drawing { anchor, current: _ } => {
                let raw = BoundingBox::from_drag(anchor, p);
                match raw.normalized() {
                    Some(bbox) => Some(Action::Create {
                        bbox,
                        class_name: ctx.selected_class.to_string(),
                        color: random_color().to_string(),
                    }),
                    None => {
                        // Too small: accidental click, discard silently
                        None
                    }
                }
            }
            GestureState::Selected { id, drag } => {
                let action = match drag {
                    Some(drag) if drag.moved => Some(Action::CommitMove { id: id.clone() }),
                    _ => None,
                };
                self.state = GestureState::Selected { id, drag: None };
                action
            }
            GestureState::Transforming {
                id,
                original,
                handle,
                scale_x,
                scale_y,
            } => {
                let bbox = anchored_resize(&original, handle, scale_x, scale_y);
                log::debug!("resize of {id} finished: scale ({scale_x:.2}, {scale_y:.2})");
                self.state = GestureState::Selected {
                    id: id.clone(),
                    drag: None,
                };
                Some(Action::Resize { id, bbox })
            }
            GestureState::Idle => None,
        }
    }

    /// Key pressed. Mode keys are the caller's concern; this handles the
    /// delete and cancel shortcuts.
    pub fn on_key(&mut self, key: Key, bindings: &KeyBindings) -> Option<Action> {
        if bindings.is_delete(key) {
            if let GestureState::Selected { id, .. } = &self.state {
                let id = id.clone();
                self.state = GestureState::Idle;
                return Some(Action::Delete { id });
            }
            return None;
        }

        if bindings.is_cancel(key) {
            if matches!(self.state, GestureState::Drawing { .. }) {
                log::debug!("draw gesture cancelled");
                self.state = GestureState::Idle;
            }
            return None;
        }

        None
    }
}

/// Scale factors accumulated by dragging `handle` to `p`, measured against
/// the gesture's original box. The corner opposite the handle stays fixed.
fn scale_for(original: &BoundingBox, handle: Handle, p: Point) -> (f32, f32) {
    let right = original.x + original.width;
    let bottom = original.y + original.height;

    let (new_width, new_height) = match handle {
        Handle::TopLeft => (right - p.x, bottom - p.y),
        Handle::TopRight => (p.x - original.x, bottom - p.y),
        Handle::BottomLeft => (right - p.x, p.y - original.y),
        Handle::BottomRight => (p.x - original.x, p.y - original.y),
    };

    (new_width / original.width, new_height / original.height)
}

/// Final box for a resize gesture: the original scaled and clamped, with
/// the origin adjusted so the corner opposite the dragged handle is fixed.
fn anchored_resize(
    original: &BoundingBox,
    handle: Handle,
    scale_x: f32,
    scale_y: f32,
) -> BoundingBox {
    let scaled = original.apply_transform(scale_x, scale_y);

    let x = match handle {
        Handle::TopLeft | Handle::BottomLeft => original.x + original.width - scaled.width,
        Handle::TopRight | Handle::BottomRight => original.x,
    };
    let y = match handle {
        Handle::TopLeft | Handle::TopRight => original.y + original.height - scaled.height,
        Handle::BottomLeft | Handle::BottomRight => original.y,
    };

    BoundingBox::new(x, y, scaled.width, scaled.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MIN_BOX_SIZE;
    use crate::model::{Annotation, ConfirmState, Geometry};
    use crate::remote::RemoteChange;

    fn store_with(id: &str, bbox: BoundingBox) -> AnnotationStore {
        let mut store = AnnotationStore::new("img-1".to_string());
        store.apply_remote(RemoteChange::insert(&Annotation {
            id: id.to_string(),
            geometry: Geometry::BoundingBox(bbox),
            class_name: "car".to_string(),
            color: "#ef4444".to_string(),
            status: Default::default(),
            confirm: ConfirmState::Confirmed,
        }));
        store
    }

    fn draw_ctx() -> GestureContext<'static> {
        GestureContext {
            mode: Mode::Draw,
            selected_class: "car",
        }
    }

    fn select_ctx() -> GestureContext<'static> {
        GestureContext {
            mode: Mode::Select,
            selected_class: "car",
        }
    }

    #[test]
    fn test_draw_gesture_creates_normalized_box() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(10.0, 10.0), &draw_ctx(), &store);
        controller.on_pointer_move(Point::new(60.0, 40.0));
        let action = controller.on_pointer_up(Point::new(100.0, 80.0), &draw_ctx());

        match action {
            Some(Action::Create {
                bbox, class_name, ..
            }) => {
                assert_eq!(bbox, BoundingBox::new(10.0, 10.0, 90.0, 70.0));
                assert_eq!(class_name, "car");
            }
            other => panic!("expected create action, got {other:?}"),
        }
        assert_eq!(*controller.state(), GestureState::Idle);
    }

    #[test]
    fn test_reverse_drag_creates_same_box() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(100.0, 80.0), &draw_ctx(), &store);
        let action = controller.on_pointer_up(Point::new(10.0, 10.0), &draw_ctx());

        match action {
            Some(Action::Create { bbox, .. }) => {
                assert_eq!(bbox, BoundingBox::new(10.0, 10.0, 90.0, 70.0));
            }
            other => panic!("expected create action, got {other:?}"),
        }
    }

    #[test]
    fn test_tiny_drag_is_discarded() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(10.0, 10.0), &draw_ctx(), &store);
        let action = controller.on_pointer_up(Point::new(13.0, 13.0), &draw_ctx());

        assert_eq!(action, None);
        assert_eq!(*controller.state(), GestureState::Idle);
    }

    #[test]
    fn test_create_color_comes_from_palette() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(0.0, 0.0), &draw_ctx(), &store);
        let action = controller.on_pointer_up(Point::new(50.0, 50.0), &draw_ctx());

        match action {
            Some(Action::Create { color, .. }) => {
                assert!(crate::color::PALETTE.contains(&color.as_str()));
            }
            other => panic!("expected create action, got {other:?}"),
        }
    }

    #[test]
    fn test_select_and_deselect() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        assert_eq!(controller.selected_id().map(String::as_str), Some("a1"));
        controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());

        // Press on empty canvas deselects
        controller.on_pointer_down(Point::new(200.0, 200.0), &select_ctx(), &store);
        assert_eq!(controller.selected_id(), None);
        assert_eq!(*controller.state(), GestureState::Idle);
    }

    #[test]
    fn test_body_drag_translates_then_commits() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        let action = controller.on_pointer_move(Point::new(35.0, 28.0));
        assert_eq!(
            action,
            Some(Action::Translate {
                id: "a1".to_string(),
                dx: 5.0,
                dy: -2.0,
            })
        );

        let action = controller.on_pointer_up(Point::new(35.0, 28.0), &select_ctx());
        assert_eq!(
            action,
            Some(Action::CommitMove {
                id: "a1".to_string()
            })
        );
        assert_eq!(controller.selected_id().map(String::as_str), Some("a1"));
    }

    #[test]
    fn test_click_without_movement_does_not_commit() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        let action = controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());

        assert_eq!(action, None);
    }

    #[test]
    fn test_resize_from_bottom_right_handle() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 100.0, 50.0));
        let mut controller = InteractionController::new();

        // Select, release, then grab the bottom-right handle
        controller.on_pointer_down(Point::new(50.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(50.0, 30.0), &select_ctx());
        controller.on_pointer_down(Point::new(110.0, 60.0), &select_ctx(), &store);
        assert!(controller.in_transform());

        controller.on_pointer_move(Point::new(210.0, 35.0));
        let action = controller.on_pointer_up(Point::new(210.0, 35.0), &select_ctx());

        match action {
            Some(Action::Resize { id, bbox }) => {
                assert_eq!(id, "a1");
                assert_eq!(bbox.x, 10.0);
                assert_eq!(bbox.y, 10.0);
                assert!((bbox.width - 200.0).abs() < 0.001);
                assert!((bbox.height - 25.0).abs() < 0.001);
            }
            other => panic!("expected resize action, got {other:?}"),
        }
        assert!(!controller.in_transform());
        assert_eq!(controller.selected_id().map(String::as_str), Some("a1"));
    }

    #[test]
    fn test_resize_clamps_to_min_size() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 100.0, 100.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(50.0, 50.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(50.0, 50.0), &select_ctx());
        controller.on_pointer_down(Point::new(110.0, 110.0), &select_ctx(), &store);

        // Collapse the box past the opposite corner
        controller.on_pointer_move(Point::new(11.0, 11.0));
        let action = controller.on_pointer_up(Point::new(11.0, 11.0), &select_ctx());

        match action {
            Some(Action::Resize { bbox, .. }) => {
                assert_eq!(bbox.width, MIN_BOX_SIZE);
                assert_eq!(bbox.height, MIN_BOX_SIZE);
            }
            other => panic!("expected resize action, got {other:?}"),
        }
    }

    #[test]
    fn test_top_left_resize_keeps_bottom_right_fixed() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 100.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(50.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(50.0, 30.0), &select_ctx());
        controller.on_pointer_down(Point::new(10.0, 10.0), &select_ctx(), &store);

        controller.on_pointer_move(Point::new(60.0, 35.0));
        let action = controller.on_pointer_up(Point::new(60.0, 35.0), &select_ctx());

        match action {
            Some(Action::Resize { bbox, .. }) => {
                // Bottom-right corner stays at (110, 60)
                assert!((bbox.x + bbox.width - 110.0).abs() < 0.001);
                assert!((bbox.y + bbox.height - 60.0).abs() < 0.001);
                assert!((bbox.width - 50.0).abs() < 0.001);
                assert!((bbox.height - 25.0).abs() < 0.001);
            }
            other => panic!("expected resize action, got {other:?}"),
        }
    }

    #[test]
    fn test_draw_while_selected_implicitly_deselects() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());
        assert_eq!(controller.selected_id().map(String::as_str), Some("a1"));

        controller.on_pointer_down(Point::new(100.0, 100.0), &draw_ctx(), &store);
        assert_eq!(controller.selected_id(), None);
        assert!(matches!(
            controller.state(),
            GestureState::Drawing { .. }
        ));
    }

    #[test]
    fn test_delete_key_emits_delete_and_resets() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();
        let bindings = KeyBindings::default();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());

        let action = controller.on_key(Key::Delete, &bindings);
        assert_eq!(
            action,
            Some(Action::Delete {
                id: "a1".to_string()
            })
        );
        assert_eq!(*controller.state(), GestureState::Idle);

        // Delete with nothing selected is a no-op
        assert_eq!(controller.on_key(Key::Delete, &bindings), None);
    }

    #[test]
    fn test_escape_cancels_draw() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();
        let bindings = KeyBindings::default();

        controller.on_pointer_down(Point::new(10.0, 10.0), &draw_ctx(), &store);
        controller.on_key(Key::Escape, &bindings);

        assert_eq!(*controller.state(), GestureState::Idle);
        assert_eq!(
            controller.on_pointer_up(Point::new(100.0, 100.0), &draw_ctx()),
            None
        );
    }

    #[test]
    fn test_preview_box_during_draw() {
        let store = AnnotationStore::new("img-1".to_string());
        let mut controller = InteractionController::new();

        assert_eq!(controller.preview_box(), None);
        controller.on_pointer_down(Point::new(10.0, 10.0), &draw_ctx(), &store);
        controller.on_pointer_move(Point::new(40.0, 5.0));

        let preview = controller.preview_box().unwrap();
        assert_eq!(preview.width, 30.0);
        assert_eq!(preview.height, -5.0);
    }

    #[test]
    fn test_clear_selection_of_removed_record() {
        let store = store_with("a1", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());

        controller.clear_selection_of("other");
        assert_eq!(controller.selected_id().map(String::as_str), Some("a1"));

        controller.clear_selection_of("a1");
        assert_eq!(controller.selected_id(), None);
    }

    #[test]
    fn test_retarget_selection_after_confirm() {
        let store = store_with("temp-x", BoundingBox::new(10.0, 10.0, 50.0, 50.0));
        let mut controller = InteractionController::new();

        controller.on_pointer_down(Point::new(30.0, 30.0), &select_ctx(), &store);
        controller.on_pointer_up(Point::new(30.0, 30.0), &select_ctx());

        controller.retarget_selection("temp-x", &"ann-1".to_string());
        assert_eq!(controller.selected_id().map(String::as_str), Some("ann-1"));
    }
}
