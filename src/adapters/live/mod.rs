//! Live adapters bound to the real process and system time.

pub mod anchor;
pub mod clock;

pub use anchor::HostAnchor;
pub use clock::LiveClock;
