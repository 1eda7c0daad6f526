//! Global keyboard shortcuts for the annotation workbench.
//!
//! Shortcuts are application-global, not scoped to canvas focus: `V` and
//! `B` switch the interaction mode, `Delete` removes the selection, and
//! `Escape` cancels an in-progress draw.

use crate::controller::Mode;

/// Keys the workbench reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    V,
    B,
    Delete,
    Escape,
}

/// Keyboard shortcut configuration.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Hotkey for select mode
    pub select_mode: Key,
    /// Hotkey for draw mode
    pub draw_mode: Key,
    /// Hotkey that deletes the current selection
    pub delete_selection: Key,
    /// Hotkey that cancels an in-progress draw gesture
    pub cancel: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            select_mode: Key::V,
            draw_mode: Key::B,
            delete_selection: Key::Delete,
            cancel: Key::Escape,
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mode that corresponds to a key press, if any.
    pub fn mode_for_key(&self, key: Key) -> Option<Mode> {
        if key == self.select_mode {
            Some(Mode::Select)
        } else if key == self.draw_mode {
            Some(Mode::Draw)
        } else {
            None
        }
    }

    pub fn is_delete(&self, key: Key) -> bool {
        key == self.delete_selection
    }

    pub fn is_cancel(&self, key: Key) -> bool {
        key == self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();

        assert_eq!(bindings.mode_for_key(Key::V), Some(Mode::Select));
        assert_eq!(bindings.mode_for_key(Key::B), Some(Mode::Draw));
        assert_eq!(bindings.mode_for_key(Key::Delete), None);
        assert!(bindings.is_delete(Key::Delete));
        assert!(bindings.is_cancel(Key::Escape));
    }
}
