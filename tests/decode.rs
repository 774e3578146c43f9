//! End-to-end fixtures: byte-exact Marshal payloads and the reader's
//! observable guarantees over them.
//!
//! Payloads are written out as produced by `Marshal.dump` under format 4.8;
//! the helpers below prepend the two-byte version header.

use rbmarshal::{decode, Error, ValueKind};

fn payload(body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x04, 0x08];
    bytes.extend_from_slice(body);
    bytes
}

// --- Roots of every primitive kind ---

#[test]
fn nil_root() {
    let bytes = payload(&[0x30]);
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Nil);
    assert_eq!(root.to_string(), "<nil>");
}

#[test]
fn bool_roots() {
    let bytes = payload(&[0x54]);
    assert!(decode(&bytes).unwrap().as_bool().unwrap());

    let bytes = payload(&[0x46]);
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Bool);
    assert!(!root.as_bool().unwrap());
}

#[test]
fn integer_one() {
    let bytes = payload(&[0x69, 0x06]);
    assert_eq!(decode(&bytes).unwrap().as_integer().unwrap(), 1);
}

#[test]
fn integer_minus_one_hundred() {
    let bytes = payload(&[0x69, 0xFF, 0x9C]);
    assert_eq!(decode(&bytes).unwrap().as_integer().unwrap(), -100);
}

#[test]
fn float_root() {
    // Marshal.dump(1.5) == "\x04\bf\b1.5"
    let bytes = payload(b"f\x081.5");
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Float);
    assert_eq!(root.as_float().unwrap(), 1.5);
}

#[test]
fn float_specials() {
    let bytes = payload(b"f\x08inf");
    assert_eq!(decode(&bytes).unwrap().as_float().unwrap(), f64::INFINITY);

    let bytes = payload(b"f\x09-inf");
    assert_eq!(
        decode(&bytes).unwrap().as_float().unwrap(),
        f64::NEG_INFINITY
    );

    let bytes = payload(b"f\x08nan");
    assert!(decode(&bytes).unwrap().as_float().unwrap().is_nan());
}

// --- Strings and symbols ---

#[test]
fn symbol_root() {
    let bytes = payload(&[0x3A, 0x08, 0x66, 0x6F, 0x6F]);
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::String);
    assert_eq!(root.as_string().unwrap(), "foo");
}

#[test]
fn raw_string_root() {
    let bytes = payload(b"\"\x08bar");
    assert_eq!(decode(&bytes).unwrap().as_string().unwrap(), "bar");
}

#[test]
fn encoded_string_root() {
    // Marshal.dump("foo") == "\x04\bI\"\bfoo\x06:\x06ET"
    let bytes = payload(b"I\"\x08foo\x06:\x06ET");
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::String);
    assert_eq!(root.as_string().unwrap(), "foo");
}

#[test]
fn array_with_symbol_backref() {
    // [:foo, :foo] — the second element back-references the symbol table.
    let bytes = payload(&[0x5B, 0x07, 0x3A, 0x08, 0x66, 0x6F, 0x6F, 0x3B, 0x00]);
    let root = decode(&bytes).unwrap();
    let items = root.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_string().unwrap(), "foo");
    assert_eq!(items[1].as_string().unwrap(), "foo");
}

// --- Composites ---

#[test]
fn map_with_symbol_key() {
    // {a: 5}
    let bytes = payload(&[0x7B, 0x06, 0x3A, 0x06, 0x61, 0x69, 0x0A]);
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Map);
    let map = root.as_map().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["a"].as_integer().unwrap(), 5);
}

#[test]
fn array_with_object_backref() {
    // ["foo", "foo"] — the second element is @1: the array itself occupies
    // object-table index 0, the first string index 1.
    let bytes = payload(&[0x5B, 0x07, 0x22, 0x08, 0x66, 0x6F, 0x6F, 0x40, 0x06]);
    let root = decode(&bytes).unwrap();
    let items = root.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_string().unwrap(), "foo");
    assert_eq!(items[1].kind(), ValueKind::String);
    assert_eq!(items[1].as_string().unwrap(), "foo");
}

#[test]
fn nested_mixed_structure() {
    // {data: [1, nil, "x"], ok: true}
    let bytes = payload(
        b"{\x07:\x09data[\x08i\x060\"\x06x:\x07okT",
    );
    let root = decode(&bytes).unwrap();
    let map = root.as_map().unwrap();
    assert_eq!(map.len(), 2);

    let items = map["data"].as_array().unwrap();
    assert_eq!(items[0].as_integer().unwrap(), 1);
    assert_eq!(items[1].kind(), ValueKind::Nil);
    assert_eq!(items[2].as_string().unwrap(), "x");

    assert!(map["ok"].as_bool().unwrap());
}

#[test]
fn map_entries_keep_key_handles() {
    // {[] => 1} — the collapsed map view renders the key as "".
    let bytes = payload(b"{\x06[\x00i\x06");
    let root = decode(&bytes).unwrap();

    let entries = root.as_map_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.kind(), ValueKind::Array);
    assert_eq!(entries[0].1.as_integer().unwrap(), 1);

    let map = root.as_map().unwrap();
    assert_eq!(map[""].as_integer().unwrap(), 1);
}

#[test]
fn user_defined_root() {
    let bytes = payload(b"u:\x08Foo\x08abc");
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::UserDefined);
    let (name, data) = root.as_user_defined().unwrap();
    assert_eq!(name.as_string().unwrap(), "Foo");
    assert_eq!(data, b"abc");
}

// --- Version header ---

#[test]
fn version_is_exposed_read_only() {
    let bytes = payload(&[0x30]);
    assert_eq!(decode(&bytes).unwrap().version(), (4, 8));

    // Mismatching versions are retained, not rejected.
    let root = decode(b"\x03\x070").unwrap();
    assert_eq!(root.version(), (3, 7));
    assert_eq!(root.kind(), ValueKind::Nil);
}

// --- Totality and determinism of kind() ---

#[test]
fn kind_is_total_on_garbage() {
    let bytes = payload(&[0xEE, 0x01, 0x02]);
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Unknown);
    assert_eq!(root.kind(), ValueKind::Unknown);
    assert!(matches!(
        root.as_array().unwrap_err(),
        Error::TypeMismatch { .. }
    ));
}

#[test]
fn kind_resolves_object_links() {
    // ["foo", @1]: the back-reference reports the target's kind.
    let bytes = payload(b"[\x07\"\x08foo@\x06");
    let root = decode(&bytes).unwrap();
    let items = root.as_array().unwrap();
    assert_eq!(items[1].kind(), ValueKind::String);
}

#[test]
fn unresolvable_object_link_is_unknown() {
    let bytes = payload(b"@\x06");
    let root = decode(&bytes).unwrap();
    assert_eq!(root.kind(), ValueKind::Unknown);
}

// --- Idempotent rematerialisation ---

#[test]
fn array_materialises_identically_twice() {
    let bytes = payload(&[0x5B, 0x07, 0x22, 0x08, 0x66, 0x6F, 0x6F, 0x40, 0x06]);
    let root = decode(&bytes).unwrap();

    let first: Vec<String> = root
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_string().unwrap())
        .collect();
    let second: Vec<String> = root
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_string().unwrap())
        .collect();
    assert_eq!(first, second);
    assert_eq!(first, vec!["foo".to_string(), "foo".to_string()]);
}

#[test]
fn map_materialises_identically_twice() {
    let bytes = payload(&[0x7B, 0x06, 0x3A, 0x06, 0x61, 0x69, 0x0A]);
    let root = decode(&bytes).unwrap();
    let first = root.as_map().unwrap();
    let second = root.as_map().unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(
        first["a"].as_integer().unwrap(),
        second["a"].as_integer().unwrap()
    );
}

// --- Error paths ---

#[test]
fn truncated_values_are_incomplete() {
    // Array announces two elements, carries one.
    let bytes = payload(b"[\x07i\x06");
    assert_eq!(
        decode(&bytes).unwrap().as_array().unwrap_err(),
        Error::IncompleteData
    );

    // String announces three bytes, carries two.
    let bytes = payload(b"\"\x08fo");
    assert_eq!(
        decode(&bytes).unwrap().as_string().unwrap_err(),
        Error::IncompleteData
    );
}

#[test]
fn unsupported_nested_type_names_the_byte() {
    let bytes = payload(b"[\x06Z");
    assert_eq!(
        decode(&bytes).unwrap().as_array().unwrap_err(),
        Error::UnsupportedType(b'Z')
    );
}

#[test]
fn malformed_float_payload() {
    let bytes = payload(b"f\x08x.y");
    assert_eq!(
        decode(&bytes).unwrap().as_float().unwrap_err(),
        Error::InvalidFloat("x.y".to_string())
    );
}

#[test]
fn adversarial_nesting_is_bounded() {
    let mut body = Vec::new();
    for _ in 0..400 {
        body.extend_from_slice(b"[\x06");
    }
    body.push(b'0');
    let bytes = payload(&body);
    assert_eq!(
        decode(&bytes).unwrap().as_array().unwrap_err(),
        Error::DepthExceeded
    );
}
