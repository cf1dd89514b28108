/*!
Fixed-capacity ring-buffer FIFOs.

Two element kinds are used across the kernel: 32-bit signed words (the GTE
and general-purpose register probes) and bytes (the CD-ROM parameter,
response and data buffers). Both share the same discipline: `enqueue` on a
full queue silently drops the value, `dequeue` on an empty queue returns the
element's default. Firmware relies on this — it probes these registers
speculatively and must never observe a panic or an error return.
*/

/// A fixed-capacity ring buffer over `T`. `enqueue` drops silently when full;
/// `dequeue` returns `T::default()` when empty.
#[derive(Clone, Debug)]
pub struct Fifo<T> {
    buf: Vec<T>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> Fifo<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FIFO capacity must be nonzero");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            head: 0,
            len: 0,
        }
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Silently drops `value` if the queue is already full.
    pub fn enqueue(&mut self, value: T) {
        if self.is_full() {
            return;
        }
        let tail = (self.head + self.len) % self.capacity;
        self.buf[tail] = value;
        self.len += 1;
    }

    pub fn enqueue_slice(&mut self, values: &[T]) {
        for &v in values {
            self.enqueue(v);
        }
    }

    /// Returns `T::default()` if the queue is empty.
    pub fn dequeue(&mut self) -> T {
        if self.is_empty() {
            return T::default();
        }
        let value = self.buf[self.head];
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        value
    }

    pub fn peek(&self) -> T {
        if self.is_empty() {
            return T::default();
        }
        self.buf[self.head]
    }
}

pub type WordFifo = Fifo<i32>;
pub type ByteFifo = Fifo<u8>;
