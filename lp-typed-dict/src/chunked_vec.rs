//! Chunked vector for allocation-sensitive contexts (e.g. embedded).
//!
//! Allocates in small chunks instead of one large contiguous block so a
//! growing dictionary never asks a fragmented heap for a big allocation.
//! Backs [`TypedDict`](crate::TypedDict), which only needs push at the end,
//! order-preserving removal, and traversal in both directions.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::ops::Index;

/// Chunk size in elements. Keeps each allocation small (~1–2KB typical).
const CHUNK_SIZE: usize = 16;

/// A vector backed by multiple smaller allocations.
///
/// Every chunk except the last is full, so index `i` always lives in chunk
/// `i / CHUNK_SIZE` at offset `i % CHUNK_SIZE`. A trailing chunk may be
/// empty after [`try_reserve_one`](Self::try_reserve_one).
#[derive(Clone, Default, Debug)]
pub struct ChunkedVec<T> {
    chunks: Vec<Vec<T>>,
    len: usize,
}

impl<T> ChunkedVec<T> {
    /// Create an empty ChunkedVec. Does not allocate.
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn chunk_and_offset(&self, i: usize) -> (usize, usize) {
        (i / CHUNK_SIZE, i % CHUNK_SIZE)
    }

    #[inline]
    fn last_chunk_full(&self) -> bool {
        self.chunks.last().map_or(true, |c| c.len() == CHUNK_SIZE)
    }

    /// Make sure the next [`push`](Self::push) will not allocate.
    ///
    /// Reports allocation failure instead of aborting, and leaves the
    /// vector unchanged when it fails.
    pub fn try_reserve_one(&mut self) -> Result<(), TryReserveError> {
        if self.last_chunk_full() {
            self.chunks.try_reserve(1)?;
            let mut chunk = Vec::new();
            chunk.try_reserve_exact(CHUNK_SIZE)?;
            self.chunks.push(chunk);
        }
        Ok(())
    }

    pub fn push(&mut self, value: T) {
        if self.last_chunk_full() {
            self.chunks.push(Vec::with_capacity(CHUNK_SIZE));
        }
        let last = self.chunks.len() - 1;
        self.chunks[last].push(value);
        self.len += 1;
    }

    /// Removes and returns the element at `index`, shifting every later
    /// element down by one. Returns `None` if index is out of bounds.
    ///
    /// O(n): the first element of each following chunk moves to the end of
    /// the chunk before it. No chunk reallocates.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let (ci, o) = self.chunk_and_offset(index);
        let val = self.chunks.get_mut(ci)?.remove(o);
        for next in ci + 1..self.chunks.len() {
            if self.chunks[next].is_empty() {
                break;
            }
            let moved = self.chunks[next].remove(0);
            self.chunks[next - 1].push(moved);
        }
        while self.chunks.last().is_some_and(Vec::is_empty) {
            self.chunks.pop();
        }
        self.len -= 1;
        Some(val)
    }

    /// Drops every element and releases all chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            return None;
        }
        let (ci, o) = self.chunk_and_offset(i);
        self.chunks.get(ci).and_then(|c| c.get(o))
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        if i >= self.len {
            return None;
        }
        let (ci, o) = self.chunk_and_offset(i);
        self.chunks.get_mut(ci).and_then(|c| c.get_mut(o))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.chunks.iter().flat_map(|c| c.iter())
    }
}

impl<T> Index<usize> for ChunkedVec<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &Self::Output {
        self.get(i).expect("ChunkedVec index out of bounds")
    }
}
