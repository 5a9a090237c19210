//! Weak side-table of keys for objects that cannot carry one themselves.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::ports::anchor::{Anchor, AnchorValue};

/// Anchor slot that carries the side-table.
pub const KEY_TABLE_SLOT: &str = "_spf_keys";

struct Entry {
    target: Weak<dyn Any + Send + Sync>,
    key: String,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// Keys of shared objects, indexed by allocation address.
///
/// Entries hold only weak references. Once the object is dropped its entry
/// is dead: it is never served again, even if a later allocation lands on
/// the same address, and it is evicted the next time a key is inserted or
/// [`prune`](Self::prune) runs.
///
/// The table also remembers the highest counter value ever minted in its
/// environment, so key minting can refuse to go backwards if the counter
/// state value is rewritten.
#[derive(Default)]
pub struct KeyTable {
    entries: Mutex<HashMap<usize, Entry>>,
    high_water: AtomicU64,
}

impl KeyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to the table parked in `anchor`, publishing a new one if the
    /// slot is vacant or holds something else.
    pub fn attach(anchor: &dyn Anchor) -> Arc<Self> {
        let fresh = || -> AnchorValue { Arc::new(Self::new()) };
        match anchor.read_or_publish(KEY_TABLE_SLOT, &fresh).downcast::<Self>() {
            Ok(table) => table,
            Err(_) => {
                tracing::warn!(slot = KEY_TABLE_SLOT, "anchor slot held a foreign value; replacing");
                let table = Arc::new(Self::new());
                anchor.write(KEY_TABLE_SLOT, Arc::clone(&table) as AnchorValue);
                table
            }
        }
    }

    /// The key recorded for `obj`, if it is still alive in the table.
    pub fn get<T: Any + Send + Sync>(&self, obj: &Arc<T>) -> Option<String> {
        self.lock().get(&address(obj)).filter(|e| e.is_live()).map(|e| e.key.clone())
    }

    /// Returns the key recorded for `obj`, or records and returns `mint()`.
    ///
    /// The lookup and the insert happen under one lock, so concurrent
    /// callers asking for the same object agree on one key and `mint` runs
    /// at most once for it.
    pub fn get_or_insert_with<T, F>(&self, obj: &Arc<T>, mint: F) -> String
    where
        T: Any + Send + Sync,
        F: FnOnce() -> String,
    {
        let addr = address(obj);
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&addr).filter(|e| e.is_live()) {
            return entry.key.clone();
        }

        entries.retain(|_, e| e.is_live());
        let key = mint();
        let target: Weak<T> = Arc::downgrade(obj);
        let target: Weak<dyn Any + Send + Sync> = target;
        entries.insert(addr, Entry { target, key: key.clone() });
        key
    }

    /// Highest counter value recorded with [`record_minted`](Self::record_minted).
    pub fn high_water(&self) -> u64 {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Records that `counter` was used in a key.
    ///
    /// Returns `false` if `counter` is not above every value recorded
    /// before, meaning some earlier key already used it.
    pub fn record_minted(&self, counter: u64) -> bool {
        self.high_water.fetch_max(counter, Ordering::SeqCst) < counter
    }

    /// Evicts entries whose object has been dropped. Returns how many went.
    pub fn prune(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_live());
        before - entries.len()
    }

    /// Number of entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn address<T>(obj: &Arc<T>) -> usize {
    Arc::as_ptr(obj).cast::<()>() as usize
}
