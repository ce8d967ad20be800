//! Typed key/value dictionary for embedded/low-memory targets.
//!
//! [`TypedDict`] maps string keys to raw bytes, bools, ints or strings, each
//! stored as an owned byte buffer with a type tag. Storage is a
//! [`ChunkedVec`], which allocates in small chunks to reduce OOM risk from
//! heap fragmentation on constrained heaps.

#![no_std]

extern crate alloc;

pub mod chunked_vec;
pub mod diagnostics;
pub mod error;
pub mod typed_dict;
pub mod value;

pub use chunked_vec::ChunkedVec;
pub use diagnostics::{Diagnostics, LogDiagnostics, SilentDiagnostics};
pub use error::{DictError, Result};
pub use typed_dict::{EntryRef, TypedDict};
pub use value::{DataType, Value};
