//! Fixed-capacity circular buffer used by the windowed indicators.

#[derive(Clone, Debug)]
pub(crate) struct RingBuffer<T> {
    buffer: Vec<T>,
    /// Slot the next push writes to.
    head: usize,
    len: usize,
    capacity: usize,
}

impl<T: Copy> RingBuffer<T> {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Slot the next [`push`](Self::push) will write to.
    #[inline]
    pub(crate) fn next_slot(&self) -> usize {
        self.head
    }

    /// Stores `value`, returning the evicted oldest value once full.
    #[inline]
    pub(crate) fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            Some(std::mem::replace(&mut self.buffer[self.head], value))
        } else {
            self.buffer.push(value);
            self.len += 1;
            None
        };
        self.head += 1;
        if self.head == self.capacity {
            self.head = 0;
        }
        evicted
    }

    /// Value stored in physical slot `slot`.
    #[inline]
    pub(crate) fn slot(&self, slot: usize) -> T {
        self.buffer[slot]
    }

    /// Values from oldest to newest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = if self.is_full() { self.head } else { 0 };
        (0..self.len).map(move |i| self.buffer[(start + i) % self.len])
    }
}
