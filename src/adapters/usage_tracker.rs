// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory access counter.
//!
//! [`UsageTracker`] is the stock [`AccessMonitor`]: it counts reads per
//! distinct [`PropertyDetails`] until [`flush`](UsageTracker::flush) hands the
//! counts to a consumer. Exporting those counts anywhere is up to the
//! consumer.

use crate::domain::{PropertyDetails, PropertyUsage};
use crate::ports::AccessMonitor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Default cap on distinct records held between flushes.
pub const DEFAULT_MAX_TRACKED_PROPERTIES: usize = 10_000;

type FlushConsumer = Arc<dyn Fn(&[PropertyUsage]) + Send + Sync>;

/// Counts instrumented reads.
///
/// # Examples
///
/// ```rust
/// use livecfg::adapters::UsageTracker;
/// use livecfg::domain::PropertyDetails;
/// use livecfg::ports::AccessMonitor;
///
/// let tracker = UsageTracker::builder().max_tracked_properties(100).build();
/// tracker.register_usage(PropertyDetails::new("a", None, "1"));
/// tracker.register_usage(PropertyDetails::new("a", None, "1"));
///
/// let usage = tracker.flush();
/// assert_eq!(usage.len(), 1);
/// assert_eq!(usage[0].count, 2);
/// assert!(tracker.flush().is_empty());
/// ```
pub struct UsageTracker {
    counts: Mutex<HashMap<PropertyDetails, u64>>,
    max_tracked: usize,
    dropped: AtomicU64,
    consumer: Option<FlushConsumer>,
}

impl UsageTracker {
    /// Creates a tracker with default settings and no flush consumer.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a tracker.
    pub fn builder() -> UsageTrackerBuilder {
        UsageTrackerBuilder::default()
    }

    /// Number of reads recorded for exactly `details` since the last flush.
    pub fn count(&self, details: &PropertyDetails) -> u64 {
        self.counts.lock().get(details).copied().unwrap_or(0)
    }

    /// Total reads recorded since the last flush.
    pub fn total(&self) -> u64 {
        self.counts.lock().values().sum()
    }

    /// Reads discarded because the tracker was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drains the recorded counts, sorted by key, and passes them to the
    /// flush consumer if one was configured.
    pub fn flush(&self) -> Vec<PropertyUsage> {
        let drained = std::mem::take(&mut *self.counts.lock());
        let mut usage: Vec<PropertyUsage> = drained
            .into_iter()
            .map(|(details, count)| PropertyUsage { details, count })
            .collect();
        usage.sort_by(|a, b| {
            a.details
                .key()
                .cmp(b.details.key())
                .then_with(|| a.details.value().cmp(b.details.value()))
        });
        debug!(records = usage.len(), "Flushing property usage");
        if let Some(consumer) = &self.consumer {
            consumer(&usage);
        }
        usage
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessMonitor for UsageTracker {
    fn register_usage(&self, details: PropertyDetails) {
        trace!(key = details.key(), "Recording property access");
        let mut counts = self.counts.lock();
        let tracked = counts.len();
        match counts.get_mut(&details) {
            Some(count) => *count += 1,
            None if tracked < self.max_tracked => {
                counts.insert(details, 1);
            }
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageTracker")
            .field("tracked", &self.counts.lock().len())
            .field("max_tracked", &self.max_tracked)
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// Builder for [`UsageTracker`].
#[derive(Default)]
pub struct UsageTrackerBuilder {
    max_tracked: Option<usize>,
    consumer: Option<FlushConsumer>,
}

impl UsageTrackerBuilder {
    /// Caps the number of distinct records held between flushes. Reads of new
    /// records beyond the cap are counted in [`UsageTracker::dropped`].
    pub fn max_tracked_properties(mut self, max: usize) -> Self {
        self.max_tracked = Some(max);
        self
    }

    /// Receives the drained records on every flush.
    pub fn on_flush(
        mut self,
        consumer: impl Fn(&[PropertyUsage]) + Send + Sync + 'static,
    ) -> Self {
        self.consumer = Some(Arc::new(consumer));
        self
    }

    /// Builds the tracker.
    pub fn build(self) -> UsageTracker {
        UsageTracker {
            counts: Mutex::new(HashMap::new()),
            max_tracked: self.max_tracked.unwrap_or(DEFAULT_MAX_TRACKED_PROPERTIES),
            dropped: AtomicU64::new(0),
            consumer: self.consumer,
        }
    }
}
