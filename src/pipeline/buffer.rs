//! Bounded window buffer
//!
//! Holds the most recent `capacity` accepted samples, shared by every producer
//! connection, the sample feed and the HTTP API. One instance is built at
//! startup and passed around as `Arc<WindowBuffer>`.
//!
//! Appends are serialized by a mutex that is never held across an `.await`.
//! Every accepted sample is also published on a broadcast channel so feed
//! subscribers see the live stream in append order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::defaults::FEED_CHANNEL_CAPACITY;
use crate::types::{VibrationSample, Window};

/// Buffer counters for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub capacity: usize,
    pub len: usize,
    /// Samples ever appended
    pub appended: u64,
    /// Samples pushed out by newer ones
    pub evicted: u64,
    /// Currently attached feed subscribers
    pub subscribers: usize,
}

/// Fixed-capacity FIFO of the most recent samples.
pub struct WindowBuffer {
    capacity: usize,
    samples: Mutex<VecDeque<VibrationSample>>,
    feed: broadcast::Sender<VibrationSample>,
    appended: AtomicU64,
    evicted: AtomicU64,
}

impl WindowBuffer {
    /// Create a buffer holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (feed, _) = broadcast::channel(FEED_CHANNEL_CAPACITY);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            feed,
            appended: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<VibrationSample>> {
        self.samples.lock().unwrap_or_else(|e| {
            tracing::warn!("Mutex poisoned on WindowBuffer, recovering");
            e.into_inner()
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append a sample at the tail, evicting from the head when full.
    pub fn append(&self, sample: VibrationSample) {
        let mut samples = self.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        samples.push_back(sample.clone());
        self.appended.fetch_add(1, Ordering::Relaxed);

        // Published under the lock so feed order matches buffer order. A send
        // error only means nobody is subscribed.
        let _ = self.feed.send(sample);
    }

    /// Copy of up to `count` most recent samples, oldest first.
    pub fn snapshot(&self, count: usize) -> Window {
        let samples = self.lock();
        let skip = samples.len().saturating_sub(count);
        samples.iter().skip(skip).cloned().collect()
    }

    /// Subscribe to the live stream, starting with up to `backlog` buffered
    /// samples.
    ///
    /// Backlog copy and receiver creation happen under the same lock, so the
    /// receiver's first sample is exactly the one appended after the backlog.
    pub fn subscribe(&self, backlog: usize) -> (Window, broadcast::Receiver<VibrationSample>) {
        let samples = self.lock();
        let skip = samples.len().saturating_sub(backlog);
        let window = samples.iter().skip(skip).cloned().collect();
        let receiver = self.feed.subscribe();
        (window, receiver)
    }

    /// Drop every buffered sample. Counters keep running.
    pub fn clear(&self) {
        let mut samples = self.lock();
        let dropped = samples.len();
        samples.clear();
        tracing::info!(dropped = dropped, "Window buffer cleared");
    }

    pub fn stats(&self) -> BufferStats {
        let len = self.lock().len();
        BufferStats {
            capacity: self.capacity,
            len,
            appended: self.appended.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            subscribers: self.feed.receiver_count(),
        }
    }
}
