//! Continuity of state and identity across framework reloads.
//!
//! Each test builds its own environment on a `MemoryAnchor`, loads the
//! framework into it, drops that load, and loads again.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use spf::adapters::memory::{ManualClock, MemoryAnchor};
use spf::identity::{KeySlot, COUNTER};
use spf::ports::{Anchor, AnchorValue};
use spf::state::{StateStore, STATE_SLOT};
use spf::{execute, CallError, Runtime};

fn environment(millis: i64) -> (Arc<MemoryAnchor>, Arc<ManualClock>) {
    (Arc::new(MemoryAnchor::new()), Arc::new(ManualClock::at_millis(millis)))
}

#[test]
fn counter_left_by_previous_load_is_not_reset() {
    let (anchor, clock) = environment(0);
    let seeded: AnchorValue =
        Arc::new(Mutex::new(BTreeMap::from([(COUNTER.to_string(), json!(5))])));
    anchor.write(STATE_SLOT, seeded);

    let runtime = Runtime::load(anchor.clone(), clock);
    assert_eq!(runtime.state.get(COUNTER), Some(json!(5)));
    assert_eq!(runtime.key_for(&mut KeySlot::new()), "0-6");
}

#[test]
fn many_reloads_share_one_counter() {
    let (anchor, clock) = environment(1_700_000_000_000);
    let mut keys = Vec::new();

    for _ in 0..5 {
        let runtime = Runtime::load(anchor.clone(), clock.clone());
        for _ in 0..3 {
            keys.push(runtime.key_for(&mut KeySlot::new()));
        }
    }

    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), 15);
    assert_eq!(StateStore::attach(anchor.as_ref()).get(COUNTER), Some(json!(15)));
}

#[test]
fn objects_keep_keys_from_before_reload() {
    let (anchor, clock) = environment(10);
    let mut link = json!({"href": "/watch"});
    let shared = Arc::new(vec!["/a", "/b"]);

    let before = Runtime::load(anchor.clone(), clock.clone());
    let link_key = before.key_for(link.as_object_mut().unwrap());
    let shared_key = before.ids.key_for_shared(&shared);
    drop(before);

    clock.advance_millis(1_000);
    let after = Runtime::load(anchor.clone(), clock);
    assert_eq!(after.key_for(link.as_object_mut().unwrap()), link_key);
    assert_eq!(after.ids.key_for_shared(&shared), shared_key);
    assert_eq!(link["spf-key"], Value::String(link_key));
}

#[test]
fn counter_grows_by_number_of_new_objects() {
    let (anchor, clock) = environment(0);
    let runtime = Runtime::load(anchor, clock);
    runtime.state.set(COUNTER, 40);

    let mut objects: Vec<Map<String, Value>> = (0..7).map(|_| Map::new()).collect();
    for obj in &mut objects {
        runtime.key_for(obj);
    }
    for obj in &mut objects {
        runtime.key_for(obj);
    }
    assert_eq!(runtime.state.get(COUNTER), Some(json!(47)));
}

#[test]
fn rewritten_counter_never_repeats_a_key() {
    let (anchor, clock) = environment(0);
    let mut issued = std::collections::HashSet::new();

    for reset in [json!(2.0), json!(-1), json!("reset"), json!(0), Value::Null] {
        let runtime = Runtime::load(anchor.clone(), clock.clone());
        for _ in 0..2 {
            let key = runtime.key_for(&mut KeySlot::new());
            assert!(issued.insert(key.clone()), "{key} handed out twice");
        }
        runtime.state.set(COUNTER, reset);
    }

    let runtime = Runtime::load(anchor, clock);
    assert_eq!(runtime.key_for(&mut KeySlot::new()), "0-11");
}

#[test]
fn fresh_environment_starts_from_scratch() {
    let (anchor, clock) = environment(0);
    Runtime::load(anchor.clone(), clock.clone()).state.set("flag", true);

    anchor.clear();
    let runtime = Runtime::load(anchor, clock);
    assert!(!runtime.state.has("flag"));
    assert_eq!(runtime.state.get(COUNTER), None);
}

#[test]
fn protected_call_hands_back_failures() {
    let ok = execute(|(a, b): (&str, &str)| format!("{a}/{b}"), ("watch", "v1"));
    assert_eq!(ok.as_deref(), Ok("watch/v1"));

    let failed: Result<Value, CallError> = execute(|()| panic!("render failed"), ());
    assert_eq!(failed.unwrap_err().message, "render failed");
}
