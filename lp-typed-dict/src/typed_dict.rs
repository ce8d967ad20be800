//! Typed key/value dictionary for low-memory targets.
//!
//! Entries live in a [`ChunkedVec`] in reverse logical order: the physical
//! end of the vector is the logical front of the dictionary. Inserting a new
//! key is then a push, and lookups scan from the most recently inserted key
//! backwards, which is where reads usually land shortly after a write.

use alloc::collections::TryReserveError;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use rustc_hash::FxHasher;

use crate::chunked_vec::ChunkedVec;
use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::error::{DictError, Result};
use crate::value::{nul_terminated_len, DataType, Value, BOOL_SIZE, INT_SIZE};

#[inline]
fn key_hash(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

fn alloc_failed(size: usize) -> impl FnOnce(TryReserveError) -> DictError {
    move |_| DictError::AllocationFailed { size }
}

struct Entry {
    key: String,
    /// FxHash of `key`; compared before the key bytes.
    hash: u64,
    data_type: DataType,
    /// Never empty.
    data: Vec<u8>,
}

impl Entry {
    #[inline]
    fn matches(&self, hash: u64, key: &str) -> bool {
        self.hash == hash && self.key == key
    }
}

/// Borrowed view of one dictionary entry.
#[derive(Clone, Copy)]
pub struct EntryRef<'a> {
    entry: &'a Entry,
}

impl<'a> EntryRef<'a> {
    pub fn key(&self) -> &'a str {
        &self.entry.key
    }

    pub fn data_type(&self) -> DataType {
        self.entry.data_type
    }

    /// Stored bytes, including the terminator for strings.
    pub fn data(&self) -> &'a [u8] {
        &self.entry.data
    }

    pub fn value(&self) -> Option<Value<'a>> {
        Value::decode(self.entry.data_type, &self.entry.data)
    }
}

impl fmt::Debug for EntryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryRef")
            .field("key", &self.key())
            .field("data_type", &self.data_type())
            .field("len", &self.data().len())
            .finish()
    }
}

/// Ordered map from string keys to tagged byte values.
///
/// New keys go to the front of the iteration order; updating an existing key
/// keeps its position. Every stored value is an owned copy of the caller's
/// bytes. Lookup, update and removal are linear scans.
pub struct TypedDict<D = LogDiagnostics> {
    entries: ChunkedVec<Entry>,
    diagnostics: D,
}

impl TypedDict {
    /// Create an empty dictionary reporting through the `log` facade.
    pub fn new() -> Self {
        Self::with_diagnostics(LogDiagnostics)
    }
}

impl<D: Diagnostics + Default> Default for TypedDict<D> {
    fn default() -> Self {
        Self::with_diagnostics(D::default())
    }
}

impl<D: Diagnostics> TypedDict<D> {
    /// Create an empty dictionary reporting to `diagnostics`.
    pub fn with_diagnostics(diagnostics: D) -> Self {
        Self {
            entries: ChunkedVec::new(),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Physical index of `key`, scanning from the logical front.
    fn position(&self, key: &str) -> Option<usize> {
        self.position_hashed(key_hash(key), key)
    }

    fn position_hashed(&self, hash: u64, key: &str) -> Option<usize> {
        (0..self.entries.len())
            .rev()
            .find(|&i| self.entries.get(i).is_some_and(|e| e.matches(hash, key)))
    }

    fn find(&self, key: &str) -> Option<&Entry> {
        self.position(key).and_then(|i| self.entries.get(i))
    }

    /// Returns true if an entry with exactly this key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Tag of the value stored under `key`.
    pub fn data_type(&self, key: &str) -> Option<DataType> {
        self.find(key).map(|e| e.data_type)
    }

    /// Removes `key` and its value. The order of the remaining keys is kept.
    /// Does nothing if the key is absent.
    pub fn remove(&mut self, key: &str) {
        if let Some(index) = self.position(key) {
            self.entries.remove(index);
        }
    }

    /// Removes every entry. The dictionary stays usable.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn reject(&self, key: &str, error: DictError) -> DictError {
        self.diagnostics.update_rejected(key, &error);
        error
    }

    /// Store the concatenation of `parts` under `key` with tag `data_type`.
    ///
    /// Every allocation happens before the dictionary is touched, so a
    /// failure leaves both a new key absent and an existing value intact.
    fn update_parts(&mut self, key: &str, parts: &[&[u8]], data_type: DataType) -> Result<()> {
        let size: usize = parts.iter().map(|p| p.len()).sum();
        if size == 0 {
            return Err(self.reject(key, DictError::EmptyValue));
        }

        let mut data = Vec::new();
        if let Err(e) = data.try_reserve_exact(size).map_err(alloc_failed(size)) {
            return Err(self.reject(key, e));
        }
        for part in parts {
            data.extend_from_slice(part);
        }

        let hash = key_hash(key);
        if let Some(index) = self.position_hashed(hash, key) {
            if let Some(entry) = self.entries.get_mut(index) {
                entry.data_type = data_type;
                entry.data = data;
            }
            return Ok(());
        }

        let mut key_copy = String::new();
        if let Err(e) = key_copy
            .try_reserve_exact(key.len())
            .map_err(alloc_failed(key.len()))
        {
            return Err(self.reject(key, e));
        }
        key_copy.push_str(key);

        if let Err(e) = self
            .entries
            .try_reserve_one()
            .map_err(alloc_failed(core::mem::size_of::<Entry>()))
        {
            return Err(self.reject(key, e));
        }
        self.entries.push(Entry {
            key: key_copy,
            hash,
            data_type,
            data,
        });
        Ok(())
    }

    /// Store a copy of `data` under `key` as [`DataType::Raw`].
    ///
    /// Empty data is rejected with [`DictError::EmptyValue`].
    pub fn update_raw(&mut self, key: &str, data: &[u8]) -> Result<()> {
        self.update_parts(key, &[data], DataType::Raw)
    }

    pub fn update_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.update_parts(key, &[&[u8::from(value)]], DataType::Bool)
    }

    pub fn update_int(&mut self, key: &str, value: i32) -> Result<()> {
        self.update_parts(key, &[&value.to_ne_bytes()], DataType::Int)
    }

    /// Store `value` followed by a terminating `0` byte, so even the empty
    /// string occupies one byte.
    pub fn update_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.update_parts(key, &[value.as_bytes(), &[0]], DataType::String)
    }

    /// Store any [`Value`] under its own tag.
    pub fn update_value(&mut self, key: &str, value: Value<'_>) -> Result<()> {
        match value {
            Value::Raw(data) => self.update_raw(key, data),
            Value::Bool(b) => self.update_bool(key, b),
            Value::Int(i) => self.update_int(key, i),
            Value::String(s) => self.update_string(key, s),
        }
    }

    /// Stored bytes for `key`, warning when the tag is not `expected`.
    fn lookup(&self, key: &str, expected: DataType) -> Option<&[u8]> {
        let entry = self.find(key)?;
        if entry.data_type != expected {
            self.diagnostics.type_mismatch(key, entry.data_type, expected);
        }
        Some(&entry.data)
    }

    /// Copy up to `out.len()` stored bytes of `key` into `out`.
    ///
    /// Returns the number of bytes copied, or `None` if the key is absent.
    /// A tag other than `expected` is reported but does not stop the read.
    pub fn read_into(&self, key: &str, expected: DataType, out: &mut [u8]) -> Option<usize> {
        let data = self.lookup(key, expected)?;
        let n = data.len().min(out.len());
        out[..n].copy_from_slice(&data[..n]);
        Some(n)
    }

    /// At most `capacity` stored bytes of `key`.
    pub fn get_raw(&self, key: &str, capacity: usize) -> Option<Vec<u8>> {
        let data = self.lookup(key, DataType::Raw)?;
        Some(data[..data.len().min(capacity)].to_vec())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let mut buf = [0u8; BOOL_SIZE];
        self.read_into(key, DataType::Bool, &mut buf)?;
        Some(buf[0] != 0)
    }

    /// Reads back a native-endian `i32`. Shorter values are zero-extended
    /// in memory order.
    pub fn get_int(&self, key: &str) -> Option<i32> {
        let mut buf = [0u8; INT_SIZE];
        self.read_into(key, DataType::Int, &mut buf)?;
        Some(i32::from_ne_bytes(buf))
    }

    /// C-style string read into a caller buffer.
    ///
    /// Copies up to `out.len()` bytes and overwrites the last copied byte
    /// with `0`, so `out` always holds a terminated string, truncated if the
    /// stored one did not fit. Returns the number of bytes copied.
    pub fn get_string_into(&self, key: &str, out: &mut [u8]) -> Option<usize> {
        let n = self.read_into(key, DataType::String, out)?;
        if let Some(last) = out[..n].last_mut() {
            *last = 0;
        }
        Some(n)
    }

    /// The string stored under `key`, as it would read from a `capacity`
    /// byte buffer: at most `capacity - 1` bytes of text.
    ///
    /// A multi-byte character cut by the limit is dropped whole, so the
    /// result always ends on a character boundary.
    pub fn get_string(&self, key: &str, capacity: usize) -> Option<String> {
        let data = self.lookup(key, DataType::String)?;
        let copied = &data[..data.len().min(capacity)];
        let text = copied.split_last().map_or(&[][..], |(_, rest)| rest);
        let text = &text[..nul_terminated_len(text)];
        let text = match core::str::from_utf8(text) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
        };
        Some(String::from(text))
    }

    /// The value under `key`, decoded strictly by its stored tag.
    pub fn get_value(&self, key: &str) -> Option<Value<'_>> {
        self.find(key).and_then(|e| Value::decode(e.data_type, &e.data))
    }

    /// Visit every entry front to back until `visitor` returns `false`.
    pub fn foreach<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, DataType, &[u8]) -> bool,
    {
        for entry in self.entries.iter().rev() {
            if !visitor(&entry.key, entry.data_type, &entry.data) {
                break;
            }
        }
    }

    /// Entries front to back.
    pub fn iter(&self) -> impl Iterator<Item = EntryRef<'_>> + '_ {
        self.entries.iter().rev().map(|entry| EntryRef { entry })
    }
}

impl<D: Diagnostics> fmt::Debug for TypedDict<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|e| (e.key(), e.value())))
            .finish()
    }
}
