//! Project class set.
//!
//! The class list is owned by the surrounding application; the core only
//! reads the current selection when a draw gesture completes and appends
//! entries on the user's behalf. Names are never validated against a
//! canonical set.

/// Ordered set of class names with a current selection.
#[derive(Debug, Clone, Default)]
pub struct ClassSet {
    names: Vec<String>,
    selected: Option<usize>,
}

impl ClassSet {
    /// Create a class set; the first entry (if any) starts selected.
    pub fn new(names: Vec<String>) -> Self {
        let selected = if names.is_empty() { None } else { Some(0) };
        Self { names, selected }
    }

    /// All class names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The currently selected class name, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.map(|idx| self.names[idx].as_str())
    }

    /// Select a class by name. Returns false if the name is unknown.
    pub fn select(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Add a class and select it.
    ///
    /// Adding an existing name does not duplicate the entry; the existing
    /// entry becomes selected instead.
    pub fn add(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        if !self.select(name) {
            self.names.push(name.to_string());
            self.selected = Some(self.names.len() - 1);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
