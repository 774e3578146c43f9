//! Float payloads: ASCII renderings of IEEE-754 doubles.
//!
//! The writer side renders doubles through Ruby's default formatter:
//! `"1.5"`, `"-12.25"`, exponent forms like `"1.0e+20"`, and the specials
//! `"inf"`, `"-inf"`, `"nan"`. Rust's `f64::from_str` accepts the same
//! grammar, with the special spellings matched case-insensitively, so
//! parsing maps onto it directly.

use crate::error::{Error, Result};

/// Parses a float payload.
///
/// Returns [`Error::InvalidFloat`] naming the payload when it is not a
/// valid double rendering.
pub fn parse(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| Error::InvalidFloat(text.to_owned()))
}
