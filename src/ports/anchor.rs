//! Anchor port: named slots that outlive the framework's own handles.

use std::any::Any;
use std::sync::Arc;

/// A value parked in an anchor slot.
pub type AnchorValue = Arc<dyn Any + Send + Sync>;

/// Well-known storage owned by the host environment.
///
/// Whatever is written to a slot must be returned unchanged by later reads
/// for as long as the environment lives, regardless of how many times the
/// framework attaches to it.
pub trait Anchor: Send + Sync {
    /// Returns the value currently held in `slot`, if any.
    fn read(&self, slot: &str) -> Option<AnchorValue>;

    /// Replaces the value held in `slot`.
    fn write(&self, slot: &str, value: AnchorValue);

    /// Returns the value in `slot`, publishing `init()` first if the slot is
    /// empty.
    ///
    /// Adapters should override this so the check and the publish happen
    /// atomically; the default is only correct without concurrent attaches.
    fn read_or_publish(&self, slot: &str, init: &dyn Fn() -> AnchorValue) -> AnchorValue {
        if let Some(existing) = self.read(slot) {
            return existing;
        }
        let value = init();
        self.write(slot, Arc::clone(&value));
        value
    }
}
