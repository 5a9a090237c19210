//! Runtime state store: named values that outlive framework reloads.
//!
//! The mapping itself is parked in an anchor slot owned by the host
//! environment. Every [`StateStore`] attached to the same anchor shares the
//! same mapping:
//!
//! ```text
//! anchor["_spf_state"] ──► Mutex<{ "counter": 3, ... }>
//!      ▲          ▲
//!   load #1    load #2   (each a StateStore handle)
//! ```
//!
//! Dropping a handle never touches the mapping; only a fresh environment
//! (a new anchor) starts from empty.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::ports::anchor::{Anchor, AnchorValue};

/// Anchor slot that carries the state mapping.
pub const STATE_SLOT: &str = "_spf_state";

/// A stored value. Heterogeneous and opaque to the store.
pub type StateValue = Value;

type Values = Mutex<BTreeMap<String, StateValue>>;

/// Handle onto the anchored state mapping.
///
/// Cloning is cheap and yields another handle onto the same mapping.
#[derive(Clone)]
pub struct StateStore {
    values: Arc<Values>,
}

impl StateStore {
    /// Attaches to the mapping held by `anchor`, creating and publishing an
    /// empty one if the slot is vacant.
    ///
    /// An existing mapping is adopted as-is. A slot holding anything other
    /// than a state mapping is overwritten with an empty one.
    pub fn attach(anchor: &dyn Anchor) -> Self {
        let fresh = || -> AnchorValue { Arc::new(Values::default()) };
        let slot = anchor.read_or_publish(STATE_SLOT, &fresh);

        let values = if let Ok(values) = slot.downcast::<Values>() {
            tracing::debug!(slot = STATE_SLOT, "attached to anchored state");
            values
        } else {
            tracing::warn!(slot = STATE_SLOT, "anchor slot held a foreign value; replacing");
            let values = Arc::new(Values::default());
            anchor.write(STATE_SLOT, Arc::clone(&values) as AnchorValue);
            values
        };

        Self { values }
    }

    /// Whether `name` currently has a value.
    pub fn has(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Returns the value stored under `name`, or `None` if it was never set.
    pub fn get(&self, name: &str) -> Option<StateValue> {
        self.lock().get(name).cloned()
    }

    /// Stores `value` under `name`, overwriting any previous value, and
    /// hands `value` back.
    pub fn set(&self, name: &str, value: impl Into<StateValue>) -> StateValue {
        let value = value.into();
        self.lock().insert(name.to_string(), value.clone());
        value
    }

    /// Replaces the value under `name` with `f(current)` in one step and
    /// returns the new value.
    ///
    /// `f` runs while the store is locked, so it must not call back into
    /// this store or mint identity keys.
    pub fn update<F>(&self, name: &str, f: F) -> StateValue
    where
        F: FnOnce(Option<&StateValue>) -> StateValue,
    {
        let mut values = self.lock();
        let next = f(values.get(name));
        values.insert(name.to_string(), next.clone());
        next
    }

    /// Adds one to the counter under `name` and returns the result.
    ///
    /// See [`increment_above`](Self::increment_above) for how the current
    /// value is read.
    pub fn increment(&self, name: &str) -> u64 {
        self.increment_above(name, 0)
    }

    /// Sets the counter under `name` to one more than the larger of its
    /// current value and `floor`, and returns it.
    ///
    /// Any non-negative integral number counts as the current value,
    /// including floats such as `2.0`. A missing value, a non-number, or a
    /// negative or fractional number counts as zero; the last three are
    /// logged.
    pub fn increment_above(&self, name: &str, floor: u64) -> u64 {
        let mut values = self.lock();
        let current = match values.get(name) {
            None => 0,
            Some(value) => counter_value(value).unwrap_or_else(|| {
                tracing::warn!(name, %value, "state value is not a counter; counting from zero");
                0
            }),
        };
        let next = current.max(floor).saturating_add(1);
        values.insert(name.to_string(), Value::from(next));
        next
    }

    /// Removes `name`, returning its last value.
    pub fn remove(&self, name: &str) -> Option<StateValue> {
        self.lock().remove(name)
    }

    /// Names of every stored value, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies every value into a JSON object.
    pub fn snapshot(&self) -> Value {
        let values = self.lock();
        Value::Object(values.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Map<_, _>>())
    }

    /// Whether `other` is a handle onto the same mapping.
    pub fn shares_mapping_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StateValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads `value` as a non-negative integer counter.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn counter_value(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    // Floats past u64::MAX saturate in the cast.
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}
