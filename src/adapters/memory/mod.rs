//! In-process adapters with isolated, controllable state.

pub mod anchor;
pub mod clock;

pub use anchor::MemoryAnchor;
pub use clock::ManualClock;
