//! rbmarshal – lazy reader for Ruby Marshal 4.8 payloads
//!
//! Marshal payloads turn up in session cookies, cache entries and
//! inter-process messages produced by Ruby applications. This crate lets a
//! consumer inspect and extract values from such a payload without running
//! any Ruby: the input is a fully buffered byte sequence, the output is a
//! tree of lazy [`Value`] handles that borrow the input buffer.
//!
//! # Beispiel
//!
//! ```
//! // Marshal.dump([1, :foo]) == "\x04\b[\ai\x06:\bfoo"
//! let bytes = b"\x04\x08[\x07i\x06:\x08foo";
//!
//! let root = rbmarshal::decode(bytes).unwrap();
//! assert_eq!(root.version(), (4, 8));
//!
//! let items = root.as_array().unwrap();
//! assert_eq!(items[0].as_integer().unwrap(), 1);
//! assert_eq!(items[1].as_string().unwrap(), "foo");
//! ```
//!
//! Decoding is single-threaded by design: every handle of one tree shares
//! the symbol and object tables that back-references resolve against.
//! Independent trees are independent.

pub mod decoder;
pub mod error;
pub mod float;
pub mod kind;
pub mod string;
pub mod symbol_table;
pub mod varint;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent — für interne
/// Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
/// Rückgabetyp von [`Value::as_map`].
pub type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Decoder
pub use decoder::{decode, Value};

// Public API: Types
pub use kind::ValueKind;

// Public API: Caches
pub use symbol_table::SymbolTable;
