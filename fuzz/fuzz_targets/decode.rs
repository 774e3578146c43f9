#![no_main]

use libfuzzer_sys::fuzz_target;
use rbmarshal::{Value, ValueKind};

/// Walks the whole tree through every extractor. Errors are expected on
/// arbitrary input; panics and out-of-bounds reads are not.
fn walk(value: &Value<'_>, depth: usize) {
    if depth > 16 {
        return;
    }
    match value.kind() {
        ValueKind::Bool => {
            let _ = value.as_bool();
        }
        ValueKind::Integer => {
            let _ = value.as_integer();
        }
        ValueKind::Float => {
            let _ = value.as_float();
        }
        ValueKind::String => {
            let _ = value.as_string();
        }
        ValueKind::Array => {
            if let Ok(items) = value.as_array() {
                for item in &items {
                    walk(item, depth + 1);
                }
            }
        }
        ValueKind::Map => {
            if let Ok(entries) = value.as_map_entries() {
                for (key, val) in &entries {
                    walk(key, depth + 1);
                    walk(val, depth + 1);
                }
            }
        }
        ValueKind::UserDefined => {
            let _ = value.as_user_defined();
        }
        _ => {}
    }
    let _ = value.to_string();
}

fuzz_target!(|data: &[u8]| {
    if let Ok(root) = rbmarshal::decode(data) {
        walk(&root, 0);
    }
});
