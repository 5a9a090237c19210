//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the runtime core and the host
//! environment (persistent slots, time). Implementations live in
//! `src/adapters/`.

pub mod anchor;
pub mod clock;

pub use anchor::{Anchor, AnchorValue};
pub use clock::Clock;
