//! Fixed-capacity circular buffers.
//!
//! Windowed indicators keep the last N raw samples here; the value evicted by
//! each insertion lets a running aggregate be updated in O(1).

use tickflow_core::Num;

/// Fixed-capacity ring that overwrites its oldest slot on every insertion.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T: Copy + Default> {
    /// Backing slots, zero-initialized.
    buffer: Vec<T>,
    /// Next slot to write, always in `[0, capacity)`.
    cursor: usize,
    /// Number of slots written at least once.
    filled: usize,
}

impl<T: Copy + Default> CircularBuffer<T> {
    /// Create a buffer of `max(1, capacity)` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![T::default(); capacity.max(1)],
            cursor: 0,
            filled: 0,
        }
    }

    /// Write `value` at the cursor and return the slot's previous occupant.
    ///
    /// Until the buffer is full the returned value is `T::default()`.
    #[inline]
    pub fn add(&mut self, value: T) -> T {
        let evicted = std::mem::replace(&mut self.buffer[self.cursor], value);
        self.cursor = (self.cursor + 1) % self.buffer.len();
        if self.filled < self.buffer.len() {
            self.filled += 1;
        }
        evicted
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of slots holding a written value.
    #[inline]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled == self.buffer.len()
    }

    /// Most recently added value.
    pub fn latest(&self) -> Option<T> {
        if self.filled == 0 {
            return None;
        }
        let capacity = self.buffer.len();
        Some(self.buffer[(self.cursor + capacity - 1) % capacity])
    }

    /// Written values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let capacity = self.buffer.len();
        let start = (self.cursor + capacity - self.filled) % capacity;
        (0..self.filled).map(move |i| self.buffer[(start + i) % capacity])
    }
}

/// Running sum of the last N samples.
#[derive(Debug, Clone)]
pub struct RollingSum {
    window: CircularBuffer<Num>,
    sum: Num,
}

impl RollingSum {
    pub fn new(length: usize) -> Self {
        Self {
            window: CircularBuffer::new(length),
            sum: Num::ZERO,
        }
    }

    /// Add a sample and return the sum of the current window.
    #[inline]
    pub fn push(&mut self, value: Num) -> Num {
        // the evicted slot is ZERO until the window fills up
        let evicted = self.window.add(value);
        self.sum = self.sum.minus(evicted).plus(value);
        self.sum
    }

    /// Current window sum.
    #[inline]
    pub fn sum(&self) -> Num {
        self.sum
    }

    /// Samples currently inside the window.
    #[inline]
    pub fn count(&self) -> usize {
        self.window.len()
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.window.capacity()
    }
}
