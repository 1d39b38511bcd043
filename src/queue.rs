//! Module Queue - the only state shared between producer contexts and
//! the cooperative loop.
//!
//! Every append and pop runs inside one short critical section (a deque
//! index update). Records that are refused or evicted are dropped after
//! the critical section ends, so freeing heap memory never extends the
//! time interrupts are masked.
//!
//! The `observed` flag mirrors the Callback Slot and is read without the
//! lock: producers use it to skip building a record nobody will receive.

use alloc::sync::Arc;
use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;

/// What a full queue does with the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Overflow {
    /// Refuse the new record; queued records are kept.
    DropNewest,
    /// Evict the oldest queued record to make room.
    DropOldest,
}

/// Why a producer did not queue an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// No callback registered; nothing was allocated.
    Unobserved,
    /// The module is stopping; producers are no longer accepted.
    Closed,
    /// Bounded queue at capacity under `Overflow::DropNewest`.
    QueueFull,
    /// The record or its payload copy could not be allocated.
    OutOfMemory,
    /// The native event was filtered by the producer adapter.
    Ignored,
}

/// Outcome of one producer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Emit {
    Queued,
    /// Queued after evicting the oldest record.
    Evicted,
    Dropped(DropReason),
}

impl Emit {
    pub fn is_queued(&self) -> bool {
        matches!(self, Emit::Queued | Emit::Evicted)
    }
}

/// Per-queue counters, read from the loop thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStats {
    pub accepted: u32,
    pub evicted: u32,
    pub dropped_full: u32,
    pub dropped_alloc: u32,
    pub dropped_closed: u32,
}

struct Inner<T, const N: usize> {
    queue: Deque<T, N>,
    open: bool,
    stats: ChannelStats,
}

/// Bounded FIFO of Event Records guarded by a critical-section mutex.
pub struct EventChannel<T, const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<T, N>>>,
    observed: AtomicBool,
    overflow: Overflow,
}

impl<T, const N: usize> EventChannel<T, N> {
    /// Create an open, empty, unobserved channel.
    pub const fn new(overflow: Overflow) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                queue: Deque::new(),
                open: true,
                stats: ChannelStats {
                    accepted: 0,
                    evicted: 0,
                    dropped_full: 0,
                    dropped_alloc: 0,
                    dropped_closed: 0,
                },
            })),
            observed: AtomicBool::new(false),
            overflow,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Lock-free "is anyone listening" check for producers.
    pub fn is_observed(&self) -> bool {
        self.observed.load(Ordering::Acquire)
    }

    pub(crate) fn set_observed(&self, observed: bool) {
        self.observed.store(observed, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().open)
    }

    /// Stop accepting records. Checked under the same lock as `push`, so
    /// no append can land after this returns.
    pub(crate) fn close(&self) {
        self.inner.lock(|cell| cell.borrow_mut().open = false);
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ChannelStats {
        self.inner.lock(|cell| cell.borrow().stats)
    }

    /// Append a record according to the overflow policy.
    pub fn push(&self, record: T) -> Emit {
        let (outcome, rejected) = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if !inner.open {
                inner.stats.dropped_closed += 1;
                return (Emit::Dropped(DropReason::Closed), Some(record));
            }
            if !inner.queue.is_full() {
                let _ = inner.queue.push_back(record);
                inner.stats.accepted += 1;
                return (Emit::Queued, None);
            }
            match self.overflow {
                Overflow::DropNewest => {
                    inner.stats.dropped_full += 1;
                    (Emit::Dropped(DropReason::QueueFull), Some(record))
                }
                Overflow::DropOldest => {
                    let evicted = inner.queue.pop_front();
                    let _ = inner.queue.push_back(record);
                    inner.stats.accepted += 1;
                    inner.stats.evicted += 1;
                    (Emit::Evicted, evicted)
                }
            }
        });
        // Freed outside the critical section.
        drop(rejected);
        outcome
    }

    /// Pop the oldest record.
    pub fn pop(&self) -> Option<T> {
        self.inner.lock(|cell| cell.borrow_mut().queue.pop_front())
    }

    /// Pop and free every queued record. Returns how many were freed.
    pub(crate) fn drain_all(&self) -> usize {
        let mut freed = 0;
        while let Some(record) = self.pop() {
            drop(record);
            freed += 1;
        }
        freed
    }

    fn note_alloc_failure(&self) {
        self.inner
            .lock(|cell| cell.borrow_mut().stats.dropped_alloc += 1);
    }
}

/// Handle given to native callbacks. Cheap to clone; holds the queue
/// alive until the native library releases it.
pub struct Producer<T, const N: usize> {
    channel: Arc<EventChannel<T, N>>,
}

impl<T, const N: usize> Clone for Producer<T, N> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

impl<T, const N: usize> Producer<T, N> {
    pub(crate) fn new(channel: Arc<EventChannel<T, N>>) -> Self {
        Self { channel }
    }

    pub fn is_observed(&self) -> bool {
        self.channel.is_observed()
    }

    /// Build and queue a record, but only if a callback is registered.
    ///
    /// `build` copies the native data and returns `None` if an allocation
    /// failed. It is not called at all when nobody is listening.
    pub fn emit_with<F>(&self, build: F) -> Emit
    where
        F: FnOnce() -> Option<T>,
    {
        if !self.channel.is_observed() {
            return Emit::Dropped(DropReason::Unobserved);
        }
        let Some(record) = build() else {
            self.channel.note_alloc_failure();
            warn!("event dropped - allocation failed");
            return Emit::Dropped(DropReason::OutOfMemory);
        };
        let outcome = self.channel.push(record);
        match outcome {
            Emit::Dropped(DropReason::QueueFull) => warn!("event dropped - queue full"),
            Emit::Evicted => debug!("queue full - evicted oldest event"),
            _ => {}
        }
        outcome
    }

    /// Queue a record that needs no allocation.
    pub fn emit(&self, record: T) -> Emit {
        self.emit_with(|| Some(record))
    }
}
