//! Lock-free single-producer single-consumer sample queue.
//!
//! The mixer thread produces interleaved stereo samples, the device
//! callback consumes them. Positions are monotonically increasing counters;
//! the slot index is the counter modulo capacity.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// SPSC queue of f32 samples with a fixed capacity.
pub struct RingBuffer {
    slots: Box<[UnsafeCell<f32>]>,
    /// Total samples ever read.
    head: AtomicUsize,
    /// Total samples ever written.
    tail: AtomicUsize,
}

// SAFETY: only one producer calls `write` and only one consumer calls
// `read`. The producer touches slots in [tail, head + capacity), the
// consumer touches slots in [head, tail); the Acquire/Release pairs on the
// counters keep those ranges disjoint.
#[allow(unsafe_code)]
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| UnsafeCell::new(0.0)).collect(),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples waiting to be read.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space in samples.
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Push as many samples as fit. Returns how many were written.
    pub fn write(&self, data: &[f32]) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let free = self.capacity() - tail.wrapping_sub(head);
        let count = data.len().min(free);

        let cap = self.capacity();
        for (i, &sample) in data[..count].iter().enumerate() {
            let slot = &self.slots[tail.wrapping_add(i) % cap];
            // SAFETY: slot lies in the free region owned by the producer.
            #[allow(unsafe_code)]
            unsafe {
                *slot.get() = sample;
            }
        }

        self.tail.store(tail.wrapping_add(count), Ordering::Release);
        count
    }

    /// Pop up to `out.len()` samples. Returns how many were read.
    pub fn read(&self, out: &mut [f32]) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let count = out.len().min(tail.wrapping_sub(head));

        let cap = self.capacity();
        for (i, dst) in out[..count].iter_mut().enumerate() {
            let slot = &self.slots[head.wrapping_add(i) % cap];
            // SAFETY: slot lies in the filled region owned by the consumer.
            #[allow(unsafe_code)]
            unsafe {
                *dst = *slot.get();
            }
        }

        self.head.store(head.wrapping_add(count), Ordering::Release);
        count
    }

    /// Drop everything queued. Consumer side only.
    pub fn clear(&self) {
        let tail = self.tail.load(Ordering::Acquire);
        self.head.store(tail, Ordering::Release);
    }
}
