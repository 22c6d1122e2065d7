//! Shared storage behind an SPSC producer/consumer pair.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ head (cache-line padded) - consumer read position     │
//! ├───────────────────────────────────────────────────────┤
//! │ tail (cache-line padded) - producer write position    │
//! ├───────────────────────────────────────────────────────┤
//! │ slots: [T; capacity]                                  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! The ring holds the values at logical positions `[head, tail)`.
//! - Producer writes slot `tail % capacity`, then Release-stores `tail + 1`
//! - Consumer reads slot `head % capacity`, then Release-stores `head + 1`
//!
//! Each side Acquire-loads the other side's cursor before touching a slot,
//! so a slot is never written and read at the same time.

use std::mem::MaybeUninit;

use crossbeam_utils::CachePadded;

use crate::slot_index;
use crate::sync::{AtomicUsize, Ordering, UnsafeCell};

/// Fixed-capacity ring with two single-writer cursors.
pub(crate) struct BoundedRing<T> {
    /// Consumer's read position. Written by the consumer only.
    head: CachePadded<AtomicUsize>,
    /// Producer's write position. Written by the producer only.
    tail: CachePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: slots in [head, tail) belong to the consumer, all others to the
// producer. The cursor protocol hands each slot to exactly one side at a time.
unsafe impl<T: Send> Send for BoundedRing<T> {}
unsafe impl<T: Send> Sync for BoundedRing<T> {}

impl<T> BoundedRing<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);

        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            slots,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub(crate) fn load_head(&self, order: Ordering) -> usize {
        self.head.load(order)
    }

    #[inline(always)]
    pub(crate) fn load_tail(&self, order: Ordering) -> usize {
        self.tail.load(order)
    }

    /// Publishes a new read position, releasing the slot just read.
    #[inline(always)]
    pub(crate) fn publish_head(&self, head: usize) {
        self.head.store(head, Ordering::Release);
    }

    /// Publishes a new write position, making the slot just written visible.
    #[inline(always)]
    pub(crate) fn publish_tail(&self, tail: usize) {
        self.tail.store(tail, Ordering::Release);
    }

    /// Writes `value` into the slot for `position`.
    ///
    /// # Safety
    ///
    /// Caller must be the producer and `position` must be outside
    /// `[head, tail)` as last observed with Acquire ordering.
    #[inline(always)]
    pub(crate) unsafe fn write_slot(&self, position: usize, value: T) {
        let slot = &self.slots[slot_index(position, self.capacity())];
        slot.with_mut(|ptr| unsafe {
            (*ptr).write(value);
        });
    }

    /// Moves the value out of the slot for `position`.
    ///
    /// # Safety
    ///
    /// Caller must be the consumer and `position` must be inside
    /// `[head, tail)` as last observed with Acquire ordering.
    #[inline(always)]
    pub(crate) unsafe fn read_slot(&self, position: usize) -> T {
        let slot = &self.slots[slot_index(position, self.capacity())];
        slot.with(|ptr| unsafe { (*ptr).assume_init_read() })
    }
}

impl<T> Drop for BoundedRing<T> {
    fn drop(&mut self) {
        // Sole owner: no other thread can touch the cursors any more.
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);

        let remaining = tail.wrapping_sub(head);
        if remaining > 0 {
            tracing::trace!(remaining, "dropping values left in spsc ring");
        }

        let capacity = self.capacity();
        let mut position = head;
        while position != tail {
            let slot = &self.slots[slot_index(position, capacity)];
            slot.with_mut(|ptr| unsafe { (*ptr).assume_init_drop() });
            position = position.wrapping_add(1);
        }
    }
}
