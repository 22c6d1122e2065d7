//! Bounded ring behind a single mutex.
//!
//! [`Ring`] is the plain fixed-capacity ring: `&mut self` operations and no
//! synchronization, for callers that already have exclusive access.
//! [`LockedRing`] wraps it in a [`parking_lot::Mutex`] so any number of
//! producers and consumers can share it. Each call holds the lock for its
//! whole body; the guard releases it on every exit path.
//!
//! FIFO order holds for the ring as a whole. Between competing producers the
//! order is whoever takes the lock first.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use nexus_ring::locked::LockedRing;
//!
//! let ring = Arc::new(LockedRing::<u32>::new(64));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let ring = Arc::clone(&ring);
//!         thread::spawn(move || {
//!             for i in 0..8 {
//!                 ring.push(t * 100 + i).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(ring.size(), 32);
//! assert_eq!(ring.drain().len(), 32);
//! ```

use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{CapacityError, Full, check_capacity};
use crate::slot_index;

/// Fixed-capacity FIFO ring without synchronization.
///
/// Holds at most `capacity` values. Occupied slots are
/// `head, head + 1, .., head + size - 1`, each reduced modulo capacity.
pub struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    size: usize,
}

impl<T> Ring<T> {
    /// Creates a ring with room for exactly `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be non-zero");
        Self::with_capacity(capacity)
    }

    /// Creates a ring, rejecting a zero capacity instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::ZeroCapacity`] if `capacity` is 0.
    pub fn try_new(capacity: usize) -> Result<Self, CapacityError> {
        check_capacity(capacity).map(Self::with_capacity)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            size: 0,
        }
    }

    /// Appends `value` at the back.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the ring holds `capacity` values.
    #[must_use = "push returns Err if full, which should be handled"]
    pub fn push(&mut self, value: T) -> Result<(), Full<T>> {
        if self.size == self.capacity() {
            return Err(Full(value));
        }

        let index = slot_index(self.head + self.size, self.capacity());
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(value);
        self.size += 1;

        Ok(())
    }

    /// Removes the value at the front, or returns `None` if the ring is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        let value = self.slots[self.head].take();
        debug_assert!(value.is_some());
        self.head = slot_index(self.head + 1, self.capacity());
        self.size -= 1;

        value
    }

    /// Returns the number of values in the ring.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the capacity of the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the ring holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if the ring holds `capacity` values.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A [`Ring`] shared between threads through one mutex.
pub struct LockedRing<T> {
    inner: Mutex<Ring<T>>,
    /// Fixed at construction, so reading it never needs the lock.
    capacity: usize,
}

impl<T> LockedRing<T> {
    /// Creates a ring with room for exactly `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self::from_ring(Ring::new(capacity))
    }

    /// Creates a ring, rejecting a zero capacity instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::ZeroCapacity`] if `capacity` is 0.
    pub fn try_new(capacity: usize) -> Result<Self, CapacityError> {
        Ring::try_new(capacity).map(Self::from_ring)
    }

    fn from_ring(ring: Ring<T>) -> Self {
        let capacity = ring.capacity();
        tracing::debug!(capacity, "created locked ring");
        Self {
            inner: Mutex::new(ring),
            capacity,
        }
    }

    /// Appends `value` under the lock.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the ring holds `capacity` values.
    #[must_use = "push returns Err if full, which should be handled"]
    pub fn push(&self, value: T) -> Result<(), Full<T>> {
        self.inner.lock().push(value)
    }

    /// Removes the front value under the lock.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop()
    }

    /// Returns the number of values in the ring.
    ///
    /// Exact at the moment the lock was held, but the lock is released before
    /// returning: a following `push`/`pop` may see a different state. Use
    /// [`lock`](Self::lock) to check and act in one critical section.
    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    /// Returns the capacity of the ring. Does not take the lock.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the ring held no values when checked.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns `true` if the ring was full when checked.
    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    /// Takes the lock and returns the inner ring for several operations in
    /// one critical section.
    pub fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.inner.lock()
    }

    /// Removes every value under a single lock acquisition, front first.
    pub fn drain(&self) -> Vec<T> {
        let mut ring = self.inner.lock();
        let mut values = Vec::with_capacity(ring.size());
        while let Some(value) = ring.pop() {
            values.push(value);
        }
        values
    }

    /// Returns the inner ring without locking.
    pub fn get_mut(&mut self) -> &mut Ring<T> {
        self.inner.get_mut()
    }

    /// Consumes the lock and returns the inner ring.
    pub fn into_inner(self) -> Ring<T> {
        self.inner.into_inner()
    }
}

impl<T> fmt::Debug for LockedRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(ring) => f.debug_struct("LockedRing").field("ring", &*ring).finish(),
            None => f
                .debug_struct("LockedRing")
                .field("ring", &format_args!("<locked>"))
                .finish(),
        }
    }
}
