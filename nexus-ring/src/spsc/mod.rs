//! Single-producer single-consumer (SPSC) bounded ring.
//!
//! Lock-free: the only synchronization is an acquire/release pair on each
//! cursor. The producer owns `tail`, the consumer owns `head`, and each reads
//! the other's cursor with Acquire before touching a slot.
//!
//! ```text
//! Producer writes slot, then Release-stores tail  →  consumer Acquire-loads tail, then reads slot
//! Consumer reads slot, then Release-stores head   →  producer Acquire-loads head, then writes slot
//! ```
//!
//! The single-writer rule is carried by the types: [`Producer`] and
//! [`Consumer`] are neither `Clone` nor usable through a shared reference for
//! `enqueue`/`dequeue`, so each cursor has exactly one writer.
//!
//! # Example
//!
//! ```
//! use nexus_ring::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(4);
//!
//! for i in 1..=4 {
//!     tx.enqueue(i).unwrap();
//! }
//! assert!(tx.enqueue(5).is_err()); // full
//!
//! assert_eq!(rx.dequeue(), Some(1));
//! assert_eq!(rx.size(), 3);
//! tx.enqueue(5).unwrap();
//! ```
//!
//! # Performance Notes
//!
//! Each endpoint caches the last value it loaded from the other side's
//! cursor. A stale cache can only under-report room (producer) or data
//! (consumer), so the Acquire load happens only when the ring looks full or
//! empty.

mod ring;

use std::fmt;
use std::sync::Arc;

use ring::BoundedRing;

use crate::error::{CapacityError, Full, check_capacity};
use crate::sync::Ordering;

/// Creates a new SPSC ring with room for exactly `capacity` values.
///
/// Returns a `(Producer, Consumer)` pair.
///
/// # Panics
///
/// Panics if `capacity` is 0.
pub fn ring_buffer<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "capacity must be non-zero");
    split(capacity)
}

/// Creates a new SPSC ring, rejecting a zero capacity instead of panicking.
///
/// # Errors
///
/// Returns [`CapacityError::ZeroCapacity`] if `capacity` is 0.
pub fn try_ring_buffer<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), CapacityError> {
    check_capacity(capacity).map(split)
}

fn split<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let ring = Arc::new(BoundedRing::new(capacity));
    tracing::debug!(capacity, "created spsc ring");

    (
        Producer {
            ring: Arc::clone(&ring),
            local_tail: 0,
            cached_head: 0,
        },
        Consumer {
            ring,
            local_head: 0,
            cached_tail: 0,
        },
    )
}

/// The writing half of an SPSC ring.
///
/// Can be moved to another thread but `enqueue` needs `&mut self`, so only
/// one thread ever writes the tail cursor.
pub struct Producer<T> {
    ring: Arc<BoundedRing<T>>,
    /// Our write position (authoritative, only we update this).
    local_tail: usize,
    /// Last head observed with Acquire. Refreshed when the ring looks full.
    cached_head: usize,
}

impl<T> Producer<T> {
    /// Appends `value` if there is room.
    ///
    /// Never blocks. On a full ring the value is handed back so the caller
    /// can decide how to retry.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the ring holds `capacity` values.
    #[inline]
    #[must_use = "enqueue returns Err if full, which should be handled"]
    pub fn enqueue(&mut self, value: T) -> Result<(), Full<T>> {
        let tail = self.local_tail;
        let capacity = self.ring.capacity();

        if tail.wrapping_sub(self.cached_head) >= capacity {
            // Acquire pairs with the consumer's Release store of head: every
            // read of the slot we are about to reuse has completed.
            self.cached_head = self.ring.load_head(Ordering::Acquire);
            if tail.wrapping_sub(self.cached_head) >= capacity {
                return Err(Full(value));
            }
        }

        // Safety: tail - head < capacity, so this slot is not in [head, tail).
        unsafe { self.ring.write_slot(tail, value) };

        self.local_tail = tail.wrapping_add(1);
        self.ring.publish_tail(self.local_tail);

        Ok(())
    }

    /// Returns the number of values in the ring.
    ///
    /// This is a snapshot for diagnostics; the consumer may drain values
    /// immediately after it is taken.
    #[inline]
    pub fn size(&self) -> usize {
        self.local_tail
            .wrapping_sub(self.ring.load_head(Ordering::Relaxed))
    }

    /// Returns the capacity of the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns `true` if the ring looked empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if the ring looked full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.capacity()
    }

    /// Returns `true` if the consumer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.ring) == 1
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

/// The reading half of an SPSC ring.
///
/// Can be moved to another thread but `dequeue` needs `&mut self`, so only
/// one thread ever writes the head cursor.
pub struct Consumer<T> {
    ring: Arc<BoundedRing<T>>,
    /// Our read position (authoritative, only we update this).
    local_head: usize,
    /// Last tail observed with Acquire. Refreshed when the ring looks empty.
    cached_tail: usize,
}

impl<T> Consumer<T> {
    /// Removes the oldest value, or returns `None` if the ring is empty.
    ///
    /// Never blocks.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        let head = self.local_head;

        if head == self.cached_tail {
            // Acquire pairs with the producer's Release store of tail: the
            // slot write for every position below it is visible.
            self.cached_tail = self.ring.load_tail(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        // Safety: head < tail, so this slot holds a published value.
        let value = unsafe { self.ring.read_slot(head) };

        self.local_head = head.wrapping_add(1);
        self.ring.publish_head(self.local_head);

        Some(value)
    }

    /// Returns the number of values in the ring.
    ///
    /// This is a snapshot for diagnostics; the producer may add values
    /// immediately after it is taken.
    #[inline]
    pub fn size(&self) -> usize {
        self.ring
            .load_tail(Ordering::Relaxed)
            .wrapping_sub(self.local_head)
    }

    /// Returns the capacity of the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns `true` if the ring looked empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if the ring looked full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.capacity()
    }

    /// Returns `true` if the producer has been dropped.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        Arc::strong_count(&self.ring) == 1
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    // ============================================================================
    // Basic Operations
    // ============================================================================

    #[test]
    fn basic_enqueue_dequeue() {
        let (mut tx, mut rx) = ring_buffer::<u64>(8);

        tx.enqueue(1).unwrap();
        tx.enqueue(2).unwrap();
        tx.enqueue(3).unwrap();

        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(3));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn capacity_is_exact() {
        let (tx, _rx) = ring_buffer::<u64>(3);
        assert_eq!(tx.capacity(), 3);

        let (tx, _rx) = ring_buffer::<u64>(100);
        assert_eq!(tx.capacity(), 100);
    }

    #[test]
    #[should_panic(expected = "capacity must be non-zero")]
    fn zero_capacity_panics() {
        let _ = ring_buffer::<u64>(0);
    }

    #[test]
    fn try_ring_buffer_rejects_zero() {
        assert!(matches!(
            try_ring_buffer::<u64>(0),
            Err(CapacityError::ZeroCapacity)
        ));
        let (tx, _rx) = try_ring_buffer::<u64>(2).unwrap();
        assert_eq!(tx.capacity(), 2);
    }

    #[test]
    fn fill_reject_drain_refill() {
        let (mut tx, mut rx) = ring_buffer::<u64>(4);
        assert_eq!(rx.size(), 0);

        for i in 1..=4 {
            tx.enqueue(i).unwrap();
        }
        assert!(tx.is_full());
        assert_eq!(tx.enqueue(5), Err(Full(5)));

        for (expected, remaining) in (1..=4).zip([3, 2, 1, 0]) {
            assert_eq!(rx.dequeue(), Some(expected));
            assert_eq!(rx.size(), remaining);
            assert_eq!(tx.size(), remaining);
        }
        assert!(rx.is_empty());

        tx.enqueue(5).unwrap();
        assert_eq!(rx.dequeue(), Some(5));
    }

    #[test]
    fn single_slot() {
        let (mut tx, mut rx) = ring_buffer::<u64>(1);

        tx.enqueue(1).unwrap();
        assert_eq!(tx.enqueue(2), Err(Full(2)));
        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), None);
        tx.enqueue(2).unwrap();
        assert_eq!(rx.dequeue(), Some(2));
    }

    #[test]
    fn wrapping_positions() {
        let (mut tx, mut rx) = ring_buffer::<u64>(3);

        // Many more values than slots, with the ring partially full.
        tx.enqueue(0).unwrap();
        for i in 1..1000 {
            tx.enqueue(i).unwrap();
            assert_eq!(rx.dequeue(), Some(i - 1));
            assert_eq!(rx.size(), 1);
        }
        assert_eq!(rx.dequeue(), Some(999));
    }

    #[test]
    fn empty_dequeue_has_no_side_effects() {
        let (mut tx, mut rx) = ring_buffer::<u64>(2);

        for _ in 0..10 {
            assert_eq!(rx.dequeue(), None);
        }
        assert_eq!(tx.size(), 0);
        tx.enqueue(9).unwrap();
        assert_eq!(rx.dequeue(), Some(9));
    }

    // ============================================================================
    // Disconnect / Drop
    // ============================================================================

    #[test]
    fn disconnect_is_observed() {
        let (tx, rx) = ring_buffer::<u64>(2);
        assert!(!tx.is_disconnected());
        drop(rx);
        assert!(tx.is_disconnected());

        let (tx, rx) = ring_buffer::<u64>(2);
        drop(tx);
        assert!(rx.is_disconnected());
    }

    #[test]
    fn consumer_drains_after_producer_dropped() {
        let (mut tx, mut rx) = ring_buffer::<u64>(4);
        tx.enqueue(1).unwrap();
        tx.enqueue(2).unwrap();
        drop(tx);

        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn drop_cleans_up_remaining() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let (mut tx, mut rx) = ring_buffer::<Tracked>(4);
        for _ in 0..3 {
            assert!(tx.enqueue(Tracked).is_ok());
        }
        drop(rx.dequeue());
        assert_eq!(DROPS.load(std::sync::atomic::Ordering::SeqCst), 1);

        drop(tx);
        drop(rx);
        assert_eq!(DROPS.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        // Sharing `&Producer`/`&Consumer` only reaches the read-only methods.
        assert_send_sync::<Producer<u64>>();
        assert_send_sync::<Consumer<u64>>();
        assert_send_sync::<Producer<String>>();
    }

    #[test]
    fn string_values() {
        let (mut tx, mut rx) = ring_buffer::<String>(2);
        tx.enqueue("hello".to_string()).unwrap();
        tx.enqueue("world".to_string()).unwrap();

        let rejected = tx.enqueue("again".to_string()).unwrap_err();
        assert_eq!(rejected.into_inner(), "again");

        assert_eq!(rx.dequeue().as_deref(), Some("hello"));
        assert_eq!(rx.dequeue().as_deref(), Some("world"));
    }

    // ============================================================================
    // Cross-thread
    // ============================================================================

    #[test]
    fn cross_thread_fifo() {
        use std::thread;

        const COUNT: u64 = 16;

        let (mut tx, mut rx) = ring_buffer::<u64>(4);

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                let mut value = i;
                while let Err(Full(v)) = tx.enqueue(value) {
                    value = v;
                    std::hint::spin_loop();
                }
            }
            tx
        });

        let mut expected = 0;
        while expected < COUNT {
            if let Some(value) = rx.dequeue() {
                assert_eq!(value, expected);
                expected += 1;
            }
        }

        let mut tx = producer.join().unwrap();
        assert_eq!(rx.dequeue(), None);
        assert!(tx.enqueue(5).is_ok());
    }
}
