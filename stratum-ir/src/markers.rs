//! Jump-marker side channel
//!
//! A pass's public contract is success or failure; it cannot return a
//! branch target. Passes that want the schedule to transfer control leave
//! a named marker here instead, and the schedule executor reads and clears
//! markers between stages. Nothing else touches this set.

/// Named markers currently present on a module.
///
/// Insertion-ordered and duplicate-free. Which marker wins when several
/// are present is not decided here: the running stage resolves against its
/// own jump-edge declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    names: Vec<String>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a marker. Setting an already-present marker is a no-op.
    pub fn set(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.iter().any(|n| *n == name) {
            self.names.push(name);
        }
    }

    /// Whether a marker is currently present.
    pub fn test(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Clear a marker. Returns whether it was present.
    pub fn clear(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }

    /// All active marker names, in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
