//! Live anchor backed by process-global storage.

use std::sync::LazyLock;

use crate::adapters::memory::MemoryAnchor;
use crate::ports::anchor::{Anchor, AnchorValue};

static HOST: LazyLock<MemoryAnchor> = LazyLock::new(MemoryAnchor::new);

/// The process itself as the host environment.
///
/// Every `HostAnchor` shares one set of slots, so state published by one
/// framework load is visible to every later load until the process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostAnchor;

impl Anchor for HostAnchor {
    fn read(&self, slot: &str) -> Option<AnchorValue> {
        HOST.read(slot)
    }

    fn write(&self, slot: &str, value: AnchorValue) {
        HOST.write(slot, value);
    }

    fn read_or_publish(&self, slot: &str, init: &dyn Fn() -> AnchorValue) -> AnchorValue {
        HOST.read_or_publish(slot, init)
    }
}
