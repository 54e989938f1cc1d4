use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;

/// Receive-side byte queue made of the `Bytes` segments returned by reads.
///
/// Extracting a range that lies inside one segment is a refcount bump;
/// a range spanning segments is copied once into a contiguous buffer.
/// Large frame bodies that arrive over many reads take the copy path.
#[derive(Debug, Default)]
pub struct SegmentedBuffer {
    segs: VecDeque<Bytes>,
    len: usize,
}

impl SegmentedBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segs: VecDeque::new(),
            len: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn push(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.len += bytes.len();
        self.segs.push_back(bytes);
    }

    /// Copy the first `dst.len()` bytes into `dst` without consuming them.
    ///
    /// Returns `false` if fewer bytes are buffered.
    pub fn peek(&self, dst: &mut [u8]) -> bool {
        if dst.len() > self.len {
            return false;
        }

        let mut filled = 0;
        for seg in &self.segs {
            if filled == dst.len() {
                break;
            }
            let take = (dst.len() - filled).min(seg.len());
            dst[filled..filled + take].copy_from_slice(&seg[..take]);
            filled += take;
        }
        true
    }

    /// Discard `n` bytes from the front.
    ///
    /// # Panics
    ///
    /// Panics if `n > self.len()`.
    pub fn advance(&mut self, mut n: usize) {
        assert!(n <= self.len, "advance past end of buffer");
        self.len -= n;

        while n > 0 {
            let Some(mut front) = self.segs.pop_front() else {
                break;
            };
            if n >= front.len() {
                n -= front.len();
                continue;
            }
            front.advance(n);
            self.segs.push_front(front);
            break;
        }
    }

    /// Remove and return exactly `n` bytes from the front.
    ///
    /// Returns `None` (consuming nothing) if fewer than `n` bytes are buffered.
    pub fn split_to(&mut self, n: usize) -> Option<Bytes> {
        if n > self.len {
            return None;
        }
        if n == 0 {
            return Some(Bytes::new());
        }

        let front = self.segs.front_mut()?;
        if front.len() >= n {
            let out = front.split_to(n);
            if front.is_empty() {
                self.segs.pop_front();
            }
            self.len -= n;
            return Some(out);
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let mut seg = self.segs.pop_front()?;
            let take = (n - out.len()).min(seg.len());
            out.extend_from_slice(&seg[..take]);
            if take < seg.len() {
                seg.advance(take);
                self.segs.push_front(seg);
            }
        }
        self.len -= n;

        Some(out.freeze())
    }
}
