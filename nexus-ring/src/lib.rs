//! # nexus-ring
//!
//! Fixed-capacity ring buffer queues for producer/consumer hand-off.
//!
//! ## Queues
//!
//! - [`spsc`]: lock-free single-producer single-consumer ring. Two
//!   monotonically increasing cursors, each written by exactly one thread,
//!   synchronized with acquire/release ordering only.
//! - [`locked`]: bounded ring behind a single mutex. Any number of producers
//!   and consumers; every operation runs inside one critical section.
//!
//! Both are non-blocking with respect to capacity: a push into a full ring
//! or a pop from an empty one fails immediately. Retry and backoff policy
//! belongs to the caller.
//!
//! ## Example
//!
//! ```
//! use nexus_ring::{locked::LockedRing, spsc};
//!
//! let (mut tx, mut rx) = spsc::ring_buffer::<u64>(4);
//! tx.enqueue(1).unwrap();
//! assert_eq!(rx.dequeue(), Some(1));
//!
//! let ring = LockedRing::<u64>::new(4);
//! ring.push(7).unwrap();
//! assert_eq!(ring.pop(), Some(7));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod sync;

pub mod locked;
pub mod spsc;

pub use error::{CapacityError, Full};

/// Maps a logical position onto a slot of a ring with `capacity` slots.
///
/// Positions never wrap back to zero in practice; only their reduction is
/// used for addressing, so "empty" (`tail == head`) and "full"
/// (`tail - head == capacity`) stay distinguishable.
#[inline(always)]
pub(crate) const fn slot_index(position: usize, capacity: usize) -> usize {
    position % capacity
}
