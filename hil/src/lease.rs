// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Leased byte buffers for split-phase transfers.
//!
//! A transfer that spans several hardware submissions needs to hand a lower
//! layer one bounded *window* of a caller's buffer at a time, while keeping
//! the full buffer recoverable once the final completion event fires. Doing
//! this with plain slices loses the rest of the buffer the moment it is
//! re-sliced; doing it with a pointer and two counters is the C way.
//!
//! [`LeasedBuffer`] keeps the reference to the complete buffer internally and
//! exposes only an active window. The layer that created the lease narrows
//! the window with [`slice`](LeasedBuffer::slice) before each submission and
//! widens it again with [`reset`](LeasedBuffer::reset) when the buffer comes
//! back through a callback. Layers that are merely handed a lease treat it
//! as an ordinary slice and never call `reset`.

use core::ops::Range;

/// A caller-owned byte buffer leased to a driver, with an active window.
///
/// All indexing and slicing is bounds checked against the underlying buffer;
/// a window that escapes the buffer is a caller bug and panics.
#[derive(Debug, PartialEq)]
pub struct LeasedBuffer<'a> {
    buffer: &'a mut [u8],
    window: Range<usize>,
}

impl<'a> LeasedBuffer<'a> {
    /// Lease `buffer` with the window covering all of it.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let len = buffer.len();
        LeasedBuffer {
            buffer,
            window: 0..len,
        }
    }

    /// Length of the active window.
    pub fn len(&self) -> usize {
        self.window.end - self.window.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the complete underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The active window, as indices into the complete buffer.
    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    /// Narrow the window to `range`, interpreted relative to the current
    /// window. Only the layer that created the lease narrows it.
    pub fn slice(&mut self, range: Range<usize>) {
        let start = self.window.start + range.start;
        let end = self.window.start + range.end;
        assert!(start <= end && end <= self.buffer.len());
        self.window = start..end;
    }

    /// Widen the window back to the complete buffer.
    ///
    /// Called by the leasing layer when the buffer returns through a
    /// callback, before re-slicing for the next submission or handing the
    /// buffer back to its owner.
    pub fn reset(&mut self) {
        self.window = 0..self.buffer.len();
    }

    /// The active window as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.window.clone()]
    }

    /// The active window as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer[self.window.clone()]
    }

    /// Recover the underlying buffer, consuming the lease.
    pub fn take(self) -> &'a mut [u8] {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::LeasedBuffer;

    #[test]
    fn window_tracks_slicing() {
        let mut raw = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut lease = LeasedBuffer::new(&mut raw);
        assert_eq!(lease.len(), 8);
        assert_eq!(lease.capacity(), 8);

        lease.slice(2..5);
        assert_eq!(lease.len(), 3);
        assert_eq!(lease.as_slice(), &[2, 3, 4]);
        assert_eq!(lease.window(), 2..5);

        // A second slice is relative to the current window.
        lease.slice(1..3);
        assert_eq!(lease.as_slice(), &[3, 4]);
        assert_eq!(lease.window(), 3..5);

        lease.reset();
        assert_eq!(lease.len(), 8);
        assert_eq!(lease.capacity(), 8);
    }

    #[test]
    fn writes_land_in_the_window() {
        let mut raw = [0u8; 6];
        let mut lease = LeasedBuffer::new(&mut raw);
        lease.slice(2..4);
        lease.as_mut_slice().copy_from_slice(&[0xaa, 0xbb]);
        lease.reset();
        assert_eq!(lease.as_slice(), &[0, 0, 0xaa, 0xbb, 0, 0]);
        assert_eq!(lease.take(), &[0, 0, 0xaa, 0xbb, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn window_cannot_escape_the_buffer() {
        let mut raw = [0u8; 4];
        let mut lease = LeasedBuffer::new(&mut raw);
        lease.slice(2..6);
    }
}
