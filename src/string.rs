//! Length-prefixed byte strings and the encoded-string trailer.
//!
//! A byte string on the wire is a long-encoded length `L` followed by `L`
//! raw bytes. Encoded strings (`I"`) append an instance-variable block
//! naming the encoding: one count byte, then a (symbol key, symbol-or-bool
//! value) pair — `E` with a bool for UTF-8/US-ASCII, `encoding` with a raw
//! string for everything else. The walker advances past that structure and
//! reports any new symbols so the caller can intern them.

use crate::error::{Error, Result};
use crate::kind;
use crate::varint;

/// Reads a length-prefixed byte string. Returns the text and the total
/// span (length prefix plus payload).
///
/// The payload is not required to be valid UTF-8 — the format carries raw
/// bytes for non-UTF-8 encodings — so invalid sequences are replaced.
pub fn read(data: &[u8]) -> Result<(String, usize)> {
    let (len, header) = varint::decode(data)?;
    let len = usize::try_from(len).map_err(|_| Error::IncompleteData)?;
    let end = header.checked_add(len).ok_or(Error::IncompleteData)?;
    let payload = data.get(header..end).ok_or(Error::IncompleteData)?;
    Ok((String::from_utf8_lossy(payload).into_owned(), end))
}

/// Walks an encoded string: the raw string itself plus the trailing block
/// carrying the encoding. Returns the text, the total span, and the new
/// symbols seen in the block.
///
/// `data` is positioned just past the `I"` tags. A missing trailer is
/// accepted and leaves the span at the bare string.
pub fn read_with_encoding(data: &[u8]) -> Result<(String, usize, Vec<String>)> {
    let (value, mut size) = read(data)?;
    let mut symbols = Vec::new();

    // Eine Paar-Struktur mit Ein-Byte-Zähler; size+1 ist das Key-Tag.
    match data.get(size + 1) {
        Some(&kind::SYMBOL) => {
            let (symbol, span) = read(&data[size + 2..])?;
            symbols.push(symbol);
            size += span + 1;
        }
        Some(&kind::SYMBOL_REF) => {
            let (_, span) = varint::decode(&data[size + 2..])?;
            size += span + 1;
        }
        _ => return Ok((value, size, symbols)),
    }

    // Pair value: a raw string names the encoding, anything else is the
    // one-byte bool of the `E` key.
    if data.get(size + 1) == Some(&kind::STRING) {
        let (_, span) = read(&data[size + 2..])?;
        size += span + 1;
    } else {
        if size + 1 >= data.len() {
            return Err(Error::IncompleteData);
        }
        size += 1;
    }

    // The count byte itself.
    size += 1;

    Ok((value, size, symbols))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string() {
        let (text, span) = read(b"\x08foo").unwrap();
        assert_eq!(text, "foo");
        assert_eq!(span, 4);
    }

    #[test]
    fn empty_string() {
        let (text, span) = read(b"\x00").unwrap();
        assert_eq!(text, "");
        assert_eq!(span, 1);
    }

    #[test]
    fn multi_byte_length_prefix() {
        let mut data = vec![0x01, 0x80];
        data.extend(std::iter::repeat(b'x').take(128));
        let (text, span) = read(&data).unwrap();
        assert_eq!(text.len(), 128);
        assert_eq!(span, 130);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let (text, span) = read(b"\x07\xFF\xFE").unwrap();
        assert_eq!(span, 3);
        assert_eq!(text.chars().filter(|&c| c == '\u{FFFD}').count(), 2);
    }

    #[test]
    fn truncated_payload() {
        assert_eq!(read(b"\x08fo").unwrap_err(), Error::IncompleteData);
        assert_eq!(read(b"").unwrap_err(), Error::IncompleteData);
    }

    #[test]
    fn negative_length() {
        // 0xFA is -1 in the single-byte form.
        assert_eq!(read(b"\xFAfoo").unwrap_err(), Error::IncompleteData);
    }

    // "foo" with the usual UTF-8 marker pair: :E => true
    #[test]
    fn encoded_with_bool_pair() {
        let data = b"\x08foo\x06:\x06ET";
        let (text, span, symbols) = read_with_encoding(data).unwrap();
        assert_eq!(text, "foo");
        assert_eq!(span, data.len());
        assert_eq!(symbols, vec!["E".to_string()]);
    }

    // "foo" with :encoding => "Shift_JIS"
    #[test]
    fn encoded_with_named_encoding() {
        let data = b"\x08foo\x06:\x0dencoding\"\x0eShift_JIS";
        let (text, span, symbols) = read_with_encoding(data).unwrap();
        assert_eq!(text, "foo");
        assert_eq!(span, data.len());
        // The encoding name itself is a raw string, not a symbol.
        assert_eq!(symbols, vec!["encoding".to_string()]);
    }

    // A back-referenced key contributes no new symbol.
    #[test]
    fn encoded_with_symbol_ref_key() {
        let data = b"\x08foo\x06;\x00T";
        let (text, span, symbols) = read_with_encoding(data).unwrap();
        assert_eq!(text, "foo");
        assert_eq!(span, data.len());
        assert!(symbols.is_empty());
    }

    #[test]
    fn encoded_without_trailer() {
        let (text, span, symbols) = read_with_encoding(b"\x08foo").unwrap();
        assert_eq!(text, "foo");
        assert_eq!(span, 4);
        assert!(symbols.is_empty());
    }

    #[test]
    fn encoded_with_truncated_bool() {
        // Key pair announced but the bool byte is missing.
        assert_eq!(
            read_with_encoding(b"\x08foo\x06:\x06E").unwrap_err(),
            Error::IncompleteData
        );
    }
}
