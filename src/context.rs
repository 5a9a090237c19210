//! Runtime context bundling the ports and the components built on them.

use std::sync::Arc;

use crate::adapters::live::{HostAnchor, LiveClock};
use crate::adapters::memory::MemoryAnchor;
use crate::config::CurrentConfig;
use crate::identity::{IdentityAssigner, Keyed};
use crate::ports::anchor::Anchor;
use crate::ports::clock::Clock;
use crate::state::StateStore;

/// One load of the framework.
///
/// Constructing a `Runtime` is what the host does each time the framework
/// code is (re)loaded. Everything anchored (state values, the identity
/// counter, shared-object keys) carries over from earlier loads on the same
/// anchor; the configuration does not and starts from the defaults.
pub struct Runtime {
    /// Clock for key timestamps.
    pub clock: Arc<dyn Clock>,
    /// Anchored state values.
    pub state: StateStore,
    /// Identity key assignment.
    pub ids: IdentityAssigner,
    /// Options and hooks for this load.
    pub config: CurrentConfig,
    anchor: Arc<dyn Anchor>,
}

impl Runtime {
    /// Loads against the process-wide host anchor and the system clock.
    #[must_use]
    pub fn live() -> Self {
        Self::load(Arc::new(HostAnchor), Arc::new(LiveClock))
    }

    /// Loads against a brand-new, private environment.
    #[must_use]
    pub fn isolated(clock: Arc<dyn Clock>) -> Self {
        Self::load(Arc::new(MemoryAnchor::new()), clock)
    }

    /// Loads against `anchor`, adopting whatever earlier loads left there.
    pub fn load(anchor: Arc<dyn Anchor>, clock: Arc<dyn Clock>) -> Self {
        let state = StateStore::attach(anchor.as_ref());
        let ids = IdentityAssigner::attach(anchor.as_ref(), state.clone(), Arc::clone(&clock));
        tracing::debug!(values = state.len(), "runtime loaded");
        Self { clock, state, ids, config: CurrentConfig::new(), anchor }
    }

    /// Loads again in the same environment, as after a script reload.
    #[must_use]
    pub fn reload(&self) -> Self {
        Self::load(Arc::clone(&self.anchor), Arc::clone(&self.clock))
    }

    /// Milliseconds since the Unix epoch, per this runtime's clock.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Shorthand for [`IdentityAssigner::key_for`].
    pub fn key_for<T: Keyed + ?Sized>(&self, obj: &mut T) -> String {
        self.ids.key_for(obj)
    }

    /// The anchor this runtime is attached to.
    pub fn anchor(&self) -> &dyn Anchor {
        self.anchor.as_ref()
    }
}
