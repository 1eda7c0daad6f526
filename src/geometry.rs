//! Bounding-box geometry for annotation gestures.
//!
//! This module contains the pure math behind drawing and editing boxes,
//! extracted for testability: normalization of raw drag rectangles,
//! minimum-size enforcement, and the transform math applied when a resize
//! handle is released.

use serde::{Deserialize, Serialize};

/// Minimum width/height for an accepted bounding box, in image pixels.
///
/// Drags at or below this size on either axis are treated as accidental
/// clicks and discarded. The same floor is enforced when a resize would
/// shrink an existing box.
pub const MIN_BOX_SIZE: f32 = 5.0;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Resize handles at the corners of a selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    /// All handles, in hit-test order.
    pub fn all() -> &'static [Handle] {
        &[
            Handle::TopLeft,
            Handle::TopRight,
            Handle::BottomLeft,
            Handle::BottomRight,
        ]
    }
}

/// An axis-aligned bounding box in image coordinates.
///
/// A *raw* box produced by an in-progress drag may hold negative width or
/// height (the drag direction is not known up front). [`BoundingBox::normalized`]
/// converts a raw box into canonical form with non-negative dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner X coordinate (canonical form)
    pub x: f32,
    /// Top-left corner Y coordinate (canonical form)
    pub y: f32,
    /// Width of the box; negative while a leftward drag is in progress
    pub width: f32,
    /// Height of the box; negative while an upward drag is in progress
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Raw box spanned by a drag from `anchor` to `current`.
    ///
    /// Dimensions are signed: dragging up or left of the anchor yields
    /// negative width/height until the box is normalized.
    pub fn from_drag(anchor: Point, current: Point) -> Self {
        Self {
            x: anchor.x,
            y: anchor.y,
            width: current.x - anchor.x,
            height: current.y - anchor.y,
        }
    }

    /// Normalize a raw drag box into canonical form.
    ///
    /// Flips the origin so width/height become non-negative, covering the
    /// same absolute region as the input. Returns `None` when either
    /// dimension is at or below [`MIN_BOX_SIZE`].
    pub fn normalized(&self) -> Option<BoundingBox> {
        if self.width.abs() <= MIN_BOX_SIZE || self.height.abs() <= MIN_BOX_SIZE {
            return None;
        }

        let x = if self.width < 0.0 {
            self.x + self.width
        } else {
            self.x
        };
        let y = if self.height < 0.0 {
            self.y + self.height
        } else {
            self.y
        };

        Some(BoundingBox::new(x, y, self.width.abs(), self.height.abs()))
    }

    /// Shift the box by a delta. Dimensions are untouched.
    pub fn translated(&self, dx: f32, dy: f32) -> BoundingBox {
        BoundingBox {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Apply accumulated resize scale factors to the box.
    ///
    /// Called when a resize handle is released: width/height are multiplied
    /// by the scale the gesture accumulated, and the conceptual scale resets
    /// to 1 so later transforms are relative to the new size rather than
    /// compounding. Each dimension is clamped to at least [`MIN_BOX_SIZE`].
    pub fn apply_transform(&self, scale_x: f32, scale_y: f32) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: (self.width * scale_x).max(MIN_BOX_SIZE),
            height: (self.height * scale_y).max(MIN_BOX_SIZE),
        }
    }

    /// Check if a point is inside the box (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Position of a resize handle.
    pub fn corner(&self, handle: Handle) -> Point {
        match handle {
            Handle::TopLeft => Point::new(self.x, self.y),
            Handle::TopRight => Point::new(self.x + self.width, self.y),
            Handle::BottomLeft => Point::new(self.x, self.y + self.height),
            Handle::BottomRight => Point::new(self.x + self.width, self.y + self.height),
        }
    }

    /// Find the resize handle within `radius` of a point, if any.
    pub fn handle_at(&self, x: f32, y: f32, radius: f32) -> Option<Handle> {
        Handle::all().iter().copied().find(|&handle| {
            let corner = self.corner(handle);
            let dx = x - corner.x;
            let dy = y - corner.y;
            (dx * dx + dy * dy).sqrt() <= radius
        })
    }
}
