//! Stable identity keys for host objects.
//!
//! Keys look like `<millis>-<counter>`: the current time from the clock
//! port and the shared `"counter"` state value after incrementing it. The
//! counter lives in the anchored [`StateStore`], so it keeps climbing across
//! framework reloads and two keys minted in the same millisecond still
//! differ.

pub mod table;

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ports::anchor::Anchor;
use crate::ports::clock::Clock;
use crate::state::StateStore;

pub use table::KeyTable;

/// Property under which a key is memoized on an object.
pub const KEY_PROPERTY: &str = "spf-key";

/// State value incremented for every key minted.
pub const COUNTER: &str = "counter";

/// An object that can carry its own identity key.
pub trait Keyed {
    /// The memoized key, if one was assigned.
    fn key(&self) -> Option<Cow<'_, str>>;

    /// Memoizes `key` on the object.
    fn set_key(&mut self, key: String);
}

/// JSON objects carry the key as their `spf-key` property.
///
/// A non-empty string is the key. A non-zero number is kept too and read as
/// its decimal text. Anything else (empty string, zero, `null`, booleans,
/// arrays, objects) counts as unassigned and is replaced.
impl Keyed for Map<String, Value> {
    fn key(&self) -> Option<Cow<'_, str>> {
        match self.get(KEY_PROPERTY)? {
            Value::String(k) if !k.is_empty() => Some(Cow::Borrowed(k)),
            Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => {
                Some(Cow::Owned(n.to_string()))
            }
            _ => None,
        }
    }

    fn set_key(&mut self, key: String) {
        self.insert(KEY_PROPERTY.to_string(), Value::String(key));
    }
}

/// A field host types embed to become [`Keyed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySlot(Option<String>);

impl KeySlot {
    /// An unassigned slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The key held, if any.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl Keyed for KeySlot {
    fn key(&self) -> Option<Cow<'_, str>> {
        self.get().map(Cow::Borrowed)
    }

    fn set_key(&mut self, key: String) {
        self.0 = Some(key);
    }
}

/// Hands out identity keys.
#[derive(Clone)]
pub struct IdentityAssigner {
    state: StateStore,
    clock: Arc<dyn Clock>,
    table: Arc<KeyTable>,
}

impl IdentityAssigner {
    /// Builds an assigner over `state`, using the side-table parked in
    /// `anchor` for shared objects.
    pub fn attach(anchor: &dyn Anchor, state: StateStore, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock, table: KeyTable::attach(anchor) }
    }

    /// Returns the key memoized on `obj`, assigning one first if needed.
    ///
    /// The counter only moves when a new key is assigned.
    pub fn key_for<T: Keyed + ?Sized>(&self, obj: &mut T) -> String {
        if let Some(key) = obj.key() {
            return key.into_owned();
        }
        let key = self.mint();
        obj.set_key(key.clone());
        key
    }

    /// Returns the key of a shared object, recorded in the weak side-table.
    ///
    /// Every clone of the same `Arc` gets the same key.
    pub fn key_for_shared<T: Any + Send + Sync>(&self, obj: &Arc<T>) -> String {
        self.table.get_or_insert_with(obj, || self.mint())
    }

    /// Mints a fresh key without memoizing it anywhere.
    ///
    /// The counter never drops below the highest value already used in
    /// this environment, so rewriting the `"counter"` state value cannot
    /// make a key come out twice.
    pub fn mint(&self) -> String {
        let now = self.clock.now_millis();
        let counter = loop {
            let counter = self.state.increment_above(COUNTER, self.table.high_water());
            if self.table.record_minted(counter) {
                break counter;
            }
        };
        let key = format!("{now}-{counter}");
        tracing::trace!(%key, "assigned identity key");
        key
    }

    /// The side-table backing [`key_for_shared`](Self::key_for_shared).
    pub fn table(&self) -> &KeyTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{ManualClock, MemoryAnchor};

    fn assigner(anchor: &MemoryAnchor, millis: i64) -> IdentityAssigner {
        let state = StateStore::attach(anchor);
        IdentityAssigner::attach(anchor, state, Arc::new(ManualClock::at_millis(millis)))
    }

    #[test]
    fn key_combines_time_and_counter() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 1_000);
        let mut obj = Map::new();
        assert_eq!(ids.key_for(&mut obj), "1000-1");
        assert_eq!(obj.get(KEY_PROPERTY), Some(&json!("1000-1")));
    }

    #[test]
    fn repeated_requests_return_memoized_key() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 1_000);
        let mut obj = Map::new();

        let first = ids.key_for(&mut obj);
        let second = ids.key_for(&mut obj);
        assert_eq!(first, second);
        assert_eq!(StateStore::attach(&anchor).get(COUNTER), Some(json!(1)));
    }

    #[test]
    fn distinct_objects_in_same_millisecond_differ() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 5);
        let mut a = KeySlot::new();
        let mut b = KeySlot::new();

        let ka = ids.key_for(&mut a);
        let kb = ids.key_for(&mut b);
        assert_ne!(ka, kb);
        assert_eq!(ka, "5-1");
        assert_eq!(kb, "5-2");
    }

    #[test]
    fn counter_grows_by_one_per_new_object() {
        let anchor = MemoryAnchor::new();
        let state = StateStore::attach(&anchor);
        state.set(COUNTER, 10);
        let ids = assigner(&anchor, 0);

        let mut objs: Vec<KeySlot> = (0..4).map(|_| KeySlot::new()).collect();
        for obj in &mut objs {
            ids.key_for(obj);
        }
        assert_eq!(state.get(COUNTER), Some(json!(14)));
    }

    #[test]
    fn existing_property_is_respected() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 0);
        let mut obj = json!({"spf-key": "123-7", "href": "/a"});

        let key = ids.key_for(obj.as_object_mut().unwrap());
        assert_eq!(key, "123-7");
        assert!(!StateStore::attach(&anchor).has(COUNTER));
    }

    #[test]
    fn numeric_property_is_kept_as_key() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 0);
        let mut obj = json!({"spf-key": 1234});

        assert_eq!(ids.key_for(obj.as_object_mut().unwrap()), "1234");
        assert_eq!(obj["spf-key"], json!(1234));
        assert!(!StateStore::attach(&anchor).has(COUNTER));
    }

    #[test]
    fn falsy_properties_are_replaced() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 9);
        let mut zero = json!({"spf-key": 0});
        let mut null = json!({"spf-key": null});

        assert_eq!(ids.key_for(zero.as_object_mut().unwrap()), "9-1");
        assert_eq!(ids.key_for(null.as_object_mut().unwrap()), "9-2");
    }

    #[test]
    fn float_counter_continues_counting() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 7);
        ids.key_for(&mut KeySlot::new());
        ids.key_for(&mut KeySlot::new());

        StateStore::attach(&anchor).set(COUNTER, json!(2.0));
        assert_eq!(ids.key_for(&mut KeySlot::new()), "7-3");
    }

    #[test]
    fn rewritten_counter_does_not_reissue_keys() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 7);
        let earlier: Vec<String> = (0..3).map(|_| ids.key_for(&mut KeySlot::new())).collect();

        let state = StateStore::attach(&anchor);
        for reset in [json!("junk"), json!(-1), json!(0), json!(1)] {
            state.set(COUNTER, reset);
            let key = ids.key_for(&mut KeySlot::new());
            assert!(!earlier.contains(&key), "{key} was already issued");
        }
        assert_eq!(state.get(COUNTER), Some(json!(7)));
    }

    #[test]
    fn empty_property_counts_as_unassigned() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 3);
        let mut obj = json!({"spf-key": ""});

        assert_eq!(ids.key_for(obj.as_object_mut().unwrap()), "3-1");
    }

    #[test]
    fn keys_survive_reattaching() {
        let anchor = MemoryAnchor::new();
        let mut obj = KeySlot::new();
        let shared = Arc::new("shared");

        let (first, first_shared) = {
            let ids = assigner(&anchor, 100);
            (ids.key_for(&mut obj), ids.key_for_shared(&shared))
        };

        let ids = assigner(&anchor, 200);
        assert_eq!(ids.key_for(&mut obj), first);
        assert_eq!(ids.key_for_shared(&shared), first_shared);
        assert_eq!(ids.key_for(&mut KeySlot::new()), "200-3");
    }

    #[test]
    fn shared_objects_get_stable_distinct_keys() {
        let anchor = MemoryAnchor::new();
        let ids = assigner(&anchor, 0);
        let a = Arc::new(1_i32);
        let b = Arc::new(1_i32);

        let ka = ids.key_for_shared(&a);
        assert_eq!(ids.key_for_shared(&Arc::clone(&a)), ka);
        assert_ne!(ids.key_for_shared(&b), ka);
        assert_eq!(ids.table().len(), 2);
    }
}
