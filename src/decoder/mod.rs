//! Marshal payload decoder.
//!
//! The entry point takes a fully buffered payload, strips the two-byte
//! format version and hands out the root [`Value`] handle. Children
//! materialise on demand; the symbol and object tables that back-references
//! resolve against are shared across every handle of the tree.
//!
//! # Beispiel
//!
//! ```
//! // Marshal.dump({a: 5}) == "\x04\b{\x06:\x06ai\n"
//! let bytes = b"\x04\x08{\x06:\x06ai\x0a";
//!
//! let root = rbmarshal::decoder::decode(bytes).unwrap();
//! let map = root.as_map().unwrap();
//! assert_eq!(map["a"].as_integer().unwrap(), 5);
//! ```

mod context;
mod value;

pub use value::Value;

use log::debug;

use crate::error::{Error, Result};

/// Decodes a Marshal payload into its root handle.
///
/// The first two bytes are the format's major and minor version; they are
/// retained verbatim and never rejected. The rest of the buffer is a
/// single value, materialised lazily through the returned handle. The
/// buffer must outlive the tree — handles borrow it, they never copy it.
pub fn decode(data: &[u8]) -> Result<Value<'_>> {
    if data.len() < 2 {
        return Err(Error::IncompleteData);
    }
    let (major, minor) = (data[0], data[1]);
    debug!(
        "marshal payload: {} bytes, format {}.{}",
        data.len(),
        major,
        minor
    );
    Ok(Value::root(major, minor, &data[2..]))
}
