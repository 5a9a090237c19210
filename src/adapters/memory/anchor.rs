//! In-memory anchor: an isolated host environment owned by a value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ports::anchor::{Anchor, AnchorValue};

/// Anchor slots held in a private map.
///
/// Each `MemoryAnchor` is its own host environment: two anchors never see
/// each other's slots. Dropping or [`clear`](Self::clear)ing it is the
/// equivalent of a full page reload.
#[derive(Default)]
pub struct MemoryAnchor {
    slots: Mutex<HashMap<String, AnchorValue>>,
}

impl MemoryAnchor {
    /// Creates an environment with no slots filled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no slot has been filled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every slot.
    pub fn clear(&self) {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Anchor for MemoryAnchor {
    fn read(&self, slot: &str) -> Option<AnchorValue> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(slot).cloned()
    }

    fn write(&self, slot: &str, value: AnchorValue) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot.to_string(), value);
    }

    fn read_or_publish(&self, slot: &str, init: &dyn Fn() -> AnchorValue) -> AnchorValue {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(slot.to_string()).or_insert_with(init))
    }
}
