//! Tag bytes and the value-kind domain of the Marshal 4.8 wire format.
//!
//! Every serialized value starts with a one-byte type tag. The only
//! two-byte case is the instance-variable wrapper `I`: `I"` carries an
//! encoded string and classifies as [`ValueKind::String`], any other inner
//! tag classifies as [`ValueKind::InstanceVariables`].

use core::fmt;

// Nil
pub const NIL: u8 = b'0';

// Boolean
pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';

// Integer ("long" payload follows)
pub const INTEGER: u8 = b'i';

// Float (length-prefixed ASCII rendering follows)
pub const FLOAT: u8 = b'f';

// Symbol: new definition and back-reference into the symbol table
pub const SYMBOL: u8 = b':';
pub const SYMBOL_REF: u8 = b';';

// Raw string (no encoding information)
pub const STRING: u8 = b'"';

// Instance-variable wrapper
pub const IVARS: u8 = b'I';

// User-defined class payload (_dump)
pub const USER_DEFINED: u8 = b'u';

// Plain object instance
pub const OBJECT: u8 = b'o';

// Composites
pub const ARRAY: u8 = b'[';
pub const MAP: u8 = b'{';

// Back-reference into the object table
pub const OBJECT_REF: u8 = b'@';

/// The kind of a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Empty data, an unrecognised tag, or an unresolvable back-reference.
    Unknown,
    Nil,
    Bool,
    Integer,
    Float,
    /// Covers raw strings, both symbol forms, and encoded (`I"`) strings.
    String,
    Array,
    Map,
    UserDefined,
    InstanceVariables,
    ObjectInstance,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Map => "map",
            Self::UserDefined => "user-defined",
            Self::InstanceVariables => "instance variables",
            Self::ObjectInstance => "object instance",
        };
        f.write_str(name)
    }
}

/// Classifies a value by its leading tag byte.
///
/// Does not resolve object back-references: `@` data classifies as
/// `Unknown` here, resolution happens at the handle level.
pub(crate) fn classify(data: &[u8]) -> ValueKind {
    let Some(&tag) = data.first() else {
        return ValueKind::Unknown;
    };
    match tag {
        NIL => ValueKind::Nil,
        TRUE | FALSE => ValueKind::Bool,
        INTEGER => ValueKind::Integer,
        FLOAT => ValueKind::Float,
        SYMBOL | SYMBOL_REF | STRING => ValueKind::String,
        USER_DEFINED => ValueKind::UserDefined,
        IVARS => {
            if data.get(1) == Some(&STRING) {
                ValueKind::String
            } else {
                ValueKind::InstanceVariables
            }
        }
        OBJECT => ValueKind::ObjectInstance,
        ARRAY => ValueKind::Array,
        MAP => ValueKind::Map,
        _ => ValueKind::Unknown,
    }
}
