//! Central error types for the Marshal reader.

use core::fmt;

use crate::kind::ValueKind;

/// All failure modes of the reader.
///
/// Every error is a deterministic consequence of the input bytes; nothing
/// is retried and no partial results are handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An extractor was called on a handle of a different kind (after
    /// object back-references were resolved).
    TypeMismatch {
        /// The kind the extractor would have read.
        expected: ValueKind,
        /// The kind the handle actually has.
        found: ValueKind,
    },
    /// The buffer ended in the middle of a value, or an intern-table
    /// back-reference points past the table.
    IncompleteData,
    /// The size prober met a tag byte it cannot skip.
    UnsupportedType(u8),
    /// Value nesting exceeds the recursion limit.
    DepthExceeded,
    /// A float payload could not be parsed as an IEEE-754 double.
    InvalidFloat(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "attempt to read a {found} value as {expected}")
            }
            Self::IncompleteData => write!(f, "incomplete data: buffer ended mid-value"),
            Self::UnsupportedType(byte) => {
                write!(
                    f,
                    "an unsupported type {:?} is nested within a map or array",
                    *byte as char
                )
            }
            Self::DepthExceeded => write!(f, "value nesting exceeds the recursion limit"),
            Self::InvalidFloat(text) => write!(f, "invalid float payload {text:?}"),
        }
    }
}

impl std::error::Error for Error {}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
