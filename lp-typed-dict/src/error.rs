//! Error types for dictionary updates.

use thiserror::Error;

/// Why an update left the dictionary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DictError {
    /// Zero-length values can't be stored; `remove` deletes a key.
    #[error("can't set zero-length data, use remove() to delete the key instead")]
    EmptyValue,

    /// The heap could not satisfy an allocation of `size` bytes.
    #[error("failed to allocate {size} bytes")]
    AllocationFailed { size: usize },
}

pub type Result<T> = core::result::Result<T, DictError>;
