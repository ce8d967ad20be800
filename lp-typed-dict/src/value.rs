//! Type tags and the typed view over stored bytes.
//!
//! Every value lives in the dictionary as an owned byte buffer plus a
//! [`DataType`] tag. Bools are one byte (`0`/`1`), ints are a native-endian
//! `i32`, strings are UTF-8 followed by a terminating `0` byte.

use core::fmt;

/// Size in bytes of a stored bool.
pub const BOOL_SIZE: usize = core::mem::size_of::<bool>();

/// Size in bytes of a stored int.
pub const INT_SIZE: usize = core::mem::size_of::<i32>();

/// Tag recorded next to every stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Raw,
    Bool,
    Int,
    String,
}

impl DataType {
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Raw => "raw",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored value decoded according to its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Raw(&'a [u8]),
    Bool(bool),
    Int(i32),
    /// String contents without the terminating `0` byte.
    String(&'a str),
}

impl<'a> Value<'a> {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Raw(_) => DataType::Raw,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::String(_) => DataType::String,
        }
    }

    /// Decode `data` strictly as `data_type`.
    ///
    /// Returns `None` when the bytes don't have the shape the tag promises.
    pub fn decode(data_type: DataType, data: &'a [u8]) -> Option<Self> {
        match data_type {
            DataType::Raw => Some(Value::Raw(data)),
            DataType::Bool => match data {
                [b] => Some(Value::Bool(*b != 0)),
                _ => None,
            },
            DataType::Int => <[u8; INT_SIZE]>::try_from(data)
                .ok()
                .map(|b| Value::Int(i32::from_ne_bytes(b))),
            DataType::String => match data.split_last() {
                Some((&0, text)) => core::str::from_utf8(text).ok().map(Value::String),
                _ => None,
            },
        }
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(data: &'a [u8]) -> Self {
        Value::Raw(data)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::String(value)
    }
}

/// Byte length of the first `0` in `data`, or `data.len()` if there is none.
pub(crate) fn nul_terminated_len(data: &[u8]) -> usize {
    data.iter().position(|&b| b == 0).unwrap_or(data.len())
}
