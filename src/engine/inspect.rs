//! Inspection helpers shared by the hand and deck engines

/// Hover-driven request that waits until the engine stops animating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectRequest {
    Expand,
    Collapse,
}

/// Result of toggling a card in inspection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange<K> {
    /// `key` became active; `previous` (if any) must go back to its slot
    Activated { previous: Option<K>, key: K },
    /// The active card was selected again and goes back
    Returned(K),
}

/// At most one active card per engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<K> {
    active: Option<K>,
}

impl<K> Default for Selection<K> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<K: Copy + PartialEq> Selection<K> {
    pub fn active(&self) -> Option<K> {
        self.active
    }

    pub fn toggle(&mut self, key: K) -> SelectionChange<K> {
        if self.active == Some(key) {
            self.active = None;
            SelectionChange::Returned(key)
        } else {
            let previous = self.active.replace(key);
            SelectionChange::Activated { previous, key }
        }
    }

    /// Drop the active card, returning it
    pub fn clear(&mut self) -> Option<K> {
        self.active.take()
    }
}
