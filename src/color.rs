//! Annotation display colors.
//!
//! Colors are a purely local display attribute: every editor picks its own
//! color for a record, including records that arrive over the change feed.
//! A color is assigned once at creation and stays stable for the
//! annotation's lifetime.

use rand::Rng;

/// Palette of annotation colors, as `#RRGGBB` hex strings.
pub const PALETTE: &[&str] = &[
    "#ef4444", // red
    "#3b82f6", // blue
    "#10b981", // green
    "#f59e0b", // yellow
    "#8b5cf6", // purple
    "#ec4899", // pink
    "#14b8a6", // teal
];

/// Pick a random palette color for a new annotation.
pub fn random_color() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..PALETTE.len());
    PALETTE[idx]
}
