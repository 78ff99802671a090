//! Bounded handoff channel for one producer and one consumer.
//!
//! A fixed-capacity FIFO built from a `Mutex<VecDeque>` and condition
//! variables: `put` waits while the buffer is full, `get` waits while it is
//! empty. Capacity is the only backpressure mechanism — a slow consumer
//! throttles the producer purely by leaving the buffer full.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Errors surfaced by [`BoundedChannel`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    #[error("get() on a drained channel after the producer finished")]
    ConsumerUnderrun,

    #[error("join timed out after {timeout:?} with {pending} item(s) unacknowledged")]
    JoinTimeout { timeout: Duration, pending: usize },
}

#[derive(Debug)]
struct Inner<T> {
    buf: VecDeque<T>,
    /// Items ever enqueued.
    enqueued: usize,
    /// Items ever dequeued.
    dequeued: usize,
    /// Items put but not yet acknowledged via `task_done`.
    unacked: usize,
    /// Largest buffer length observed; never exceeds capacity.
    high_water: usize,
    producer_done: bool,
}

/// Fixed-capacity FIFO with blocking `put`/`get`.
///
/// Shared by reference between two execution contexts (see
/// `std::thread::scope` in the pipeline); no `Arc` is required. The mutex is
/// released while waiting on a condvar, so a blocked `put` never prevents a
/// `get` from making progress, and vice versa.
#[derive(Debug)]
pub struct BoundedChannel<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    drained: Condvar,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, ChannelError> {
        if capacity < 1 {
            return Err(ChannelError::InvalidCapacity(capacity));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                buf: VecDeque::with_capacity(capacity),
                enqueued: 0,
                dequeued: 0,
                unacked: 0,
                high_water: 0,
                producer_done: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
            capacity,
        })
    }

    /// Append `item` to the tail, blocking while the buffer is full.
    pub fn put(&self, item: T) {
        let mut inner = self.inner.lock().unwrap();
        // While loop re-checks the condition after spurious wakeups.
        while inner.buf.len() >= self.capacity {
            inner = self.not_full.wait(inner).unwrap();
        }
        inner.buf.push_back(item);
        inner.enqueued += 1;
        inner.unacked += 1;
        if inner.buf.len() > inner.high_water {
            inner.high_water = inner.buf.len();
        }
        self.not_empty.notify_one();
    }

    /// Remove and return the head, blocking while the buffer is empty.
    ///
    /// Once the producer has called [`finish`](Self::finish) and the buffer
    /// is drained, further calls return [`ChannelError::ConsumerUnderrun`]
    /// instead of blocking forever.
    pub fn get(&self) -> Result<T, ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        while inner.buf.is_empty() {
            if inner.producer_done {
                return Err(ChannelError::ConsumerUnderrun);
            }
            inner = self.not_empty.wait(inner).unwrap();
        }
        let item = inner.buf.pop_front().unwrap();
        inner.dequeued += 1;
        self.not_full.notify_one();
        Ok(item)
    }

    /// Producer-side end-of-stream signal. Wakes any blocked getter so it can
    /// observe the drained channel.
    pub fn finish(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.producer_done = true;
        self.not_empty.notify_all();
    }

    /// Consumer acknowledgment that one received item has been processed.
    pub fn task_done(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.unacked = inner.unacked.saturating_sub(1);
        if inner.unacked == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until every item ever `put` has been acknowledged.
    pub fn join(&self) {
        let mut inner = self.inner.lock().unwrap();
        while inner.unacked > 0 {
            inner = self.drained.wait(inner).unwrap();
        }
    }

    /// Like [`join`](Self::join), but give up after `timeout`.
    pub fn join_timeout(&self, timeout: Duration) -> Result<(), ChannelError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock().unwrap();
        while inner.unacked > 0 {
            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::JoinTimeout {
                    timeout,
                    pending: inner.unacked,
                });
            }
            let (guard, _) = self.drained.wait_timeout(inner, deadline - now).unwrap();
            inner = guard;
        }
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items ever enqueued.
    pub fn enqueued(&self) -> usize {
        self.inner.lock().unwrap().enqueued
    }

    /// Items ever dequeued.
    pub fn dequeued(&self) -> usize {
        self.inner.lock().unwrap().dequeued
    }

    /// Largest buffer length observed so far.
    pub fn high_water_mark(&self) -> usize {
        self.inner.lock().unwrap().high_water
    }
}
