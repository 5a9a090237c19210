//! `spf keys` command.

use serde_json::{json, Map, Value};

use crate::context::Runtime;
use crate::identity::{KeySlot, COUNTER};

/// Execute the `keys` command.
///
/// Loads the framework `reloads` times in this process. Each load mints
/// `count` keys for fresh objects and asks again for the key of one page
/// object that outlives every load. The page key stays the same and the
/// counter keeps climbing across loads.
///
/// # Errors
///
/// Returns an error string if the page object's key changes between loads.
pub fn run(count: u32, reloads: u32) -> Result<(), String> {
    let mut page = Map::new();
    page.insert("url".to_string(), json!("/"));
    let mut page_key: Option<String> = None;

    let mut runtime = Runtime::live();
    for load in 1..=reloads.max(1) {
        if load > 1 {
            runtime = runtime.reload();
        }

        let key = runtime.key_for(&mut page);
        match &page_key {
            Some(first) if *first != key => {
                return Err(format!("Page key changed across reload: {first} -> {key}"));
            }
            Some(_) => {}
            None => page_key = Some(key.clone()),
        }
        println!("load {load} page {key}");

        for _ in 0..count {
            let key = runtime.key_for(&mut KeySlot::new());
            println!("load {load} key {key}");
        }
    }

    let counter = runtime.state.get(COUNTER).unwrap_or(Value::from(0));
    println!("counter {counter}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_command_succeeds_across_reloads() {
        assert!(run(2, 3).is_ok());
    }

    #[test]
    fn zero_reloads_still_loads_once() {
        assert!(run(0, 0).is_ok());
    }
}
