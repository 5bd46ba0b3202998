//! Ring — fixed-capacity buffer holding the last `capacity` bytes of a stream.
//!
//! # Invariants
//! - `buf.len() <= capacity`.
//! - While filling (`buf.len() < capacity`) the oldest byte is at index 0.
//! - Once full, `head` is both the oldest byte and the next write position.
//!
//! The buffer grows lazily so small streams never pay for a full window.

pub(crate) struct TailRing {
    buf: Vec<u8>,
    head: usize,
    capacity: usize,
}

impl TailRing {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            head: 0,
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn push(&mut self, mut data: &[u8]) {
        if self.capacity == 0 || data.is_empty() {
            return;
        }

        if data.len() >= self.capacity {
            self.buf.clear();
            self.buf.extend_from_slice(&data[data.len() - self.capacity..]);
            self.head = 0;
            return;
        }

        if self.buf.len() < self.capacity {
            let take = (self.capacity - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if data.is_empty() {
                return;
            }
        }

        // Full: overwrite the oldest bytes, wrapping once at most.
        let first = (self.capacity - self.head).min(data.len());
        self.buf[self.head..self.head + first].copy_from_slice(&data[..first]);
        let rest = &data[first..];
        self.buf[..rest.len()].copy_from_slice(rest);
        self.head = (self.head + data.len()) % self.capacity;
    }

    /// Consume the ring, returning retained bytes in stream order.
    pub(crate) fn into_contiguous(mut self) -> Vec<u8> {
        if self.head != 0 {
            self.buf.rotate_left(self.head);
        }
        self.buf
    }
}
