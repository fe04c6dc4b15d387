//! Bounded, time-ordered sample archive.
//!
//! An [`Archive`] retains the most recent `capacity` samples of a value and
//! forwards every sample it evicts to an [`OverspillSink`]. It is the type
//! monitoring code shares between producer and consumer threads.
//!
//! # States
//!
//! ```text
//!            accept()               clear()
//!   EMPTY ─────────────▶ ACTIVE ─────────────▶ EMPTY
//!  (no buffer)        (buffer holds 0..=capacity samples)
//! ```
//!
//! `set_capacity` on an EMPTY archive only records the capacity used for the
//! next allocation. On an ACTIVE archive it migrates: a new buffer is built at
//! the new capacity and the old contents are replayed into it oldest first.
//! Samples that no longer fit are overspilled exactly as if ordinary `accept`
//! calls had evicted them.
//!
//! # Concurrency
//!
//! - `accept`, `set_capacity` and `clear` share one mutation lock.
//! - The current buffer is published through an atomically swapped `Arc`.
//!   Published buffers are never modified; each mutation builds the next
//!   buffer and swaps the handle.
//! - Readers (`get_archive*`, `query`, accessors) never take the lock. They
//!   load the handle once and copy out of that buffer, so they may miss a
//!   mutation that completes concurrently but never see a partial one.
//! - The overspill sink runs on the mutating thread, under the lock.
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use overspill::{Archive, Sample};
//! use overspill::sink::CollectingSink;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let evicted = Arc::new(CollectingSink::<f64>::new());
//! let archive = Archive::with_shared_overspill(3, evicted.clone())?;
//!
//! for ts in 1..=5 {
//!     archive.accept(Sample::new(ts, ts as f64 * 1.5));
//! }
//!
//! let retained: Vec<i64> = archive.get_archive().iter().map(Sample::timestamp).collect();
//! assert_eq!(retained, vec![3, 4, 5]);
//! assert_eq!(archive.get_archive_since(4).len(), 2);
//! assert_eq!(evicted.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{ArchiveError, Result};
use crate::query::{self, QueryResult};
use crate::ring::RingBuffer;
use crate::sample::Sample;
use crate::sink::{DiscardSink, OverspillSink};

/// Largest capacity an archive accepts.
///
/// Guards against allocating unbounded buffers from misconfigured capacities.
pub const MAX_CAPACITY: usize = 1 << 24;

/// A bounded, thread-safe archive of timestamped samples.
///
/// Samples must be accepted in non-decreasing timestamp order; the archive
/// does not re-sort or validate this, and `since` queries rely on it.
pub struct Archive<T> {
    /// Serializes `accept`, `set_capacity` and `clear`.
    mutation: Mutex<()>,
    /// Configured capacity. Written only under `mutation`.
    capacity: AtomicUsize,
    /// Current buffer; `None` while EMPTY.
    buffer: ArcSwapOption<RingBuffer<Sample<T>>>,
    /// Receives every evicted sample.
    overspill: Arc<dyn OverspillSink<T>>,
    /// Number of samples handed to `overspill` so far.
    overspilled: AtomicU64,
}

/// Rejects capacities above [`MAX_CAPACITY`].
fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity > MAX_CAPACITY {
        return Err(ArchiveError::InvalidCapacity {
            capacity,
            max: MAX_CAPACITY,
        }
        .into());
    }
    Ok(())
}

impl<T: 'static> Archive<T> {
    /// Creates an empty archive that discards overspill.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCapacity`] if `capacity` exceeds
    /// [`MAX_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_overspill(capacity, DiscardSink)
    }

    /// Creates an empty archive that forwards overspill to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCapacity`] if `capacity` exceeds
    /// [`MAX_CAPACITY`].
    pub fn with_overspill<S>(capacity: usize, sink: S) -> Result<Self>
    where
        S: OverspillSink<T> + 'static,
    {
        Self::with_shared_overspill(capacity, Arc::new(sink))
    }
}

impl<T> Archive<T> {
    /// Creates an empty archive that forwards overspill to a shared sink.
    ///
    /// Use this to chain archives while keeping a handle on the secondary:
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use overspill::{Archive, Sample};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let hourly = Arc::new(Archive::<i32>::new(24)?);
    /// let recent = Archive::with_shared_overspill(2, hourly.clone())?;
    ///
    /// for ts in 0..3i32 {
    ///     recent.accept(Sample::new(i64::from(ts), ts));
    /// }
    /// assert_eq!(hourly.get_archive(), vec![Sample::new(0, 0)]);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCapacity`] if `capacity` exceeds
    /// [`MAX_CAPACITY`].
    pub fn with_shared_overspill(capacity: usize, sink: Arc<dyn OverspillSink<T>>) -> Result<Self> {
        validate_capacity(capacity)?;
        Ok(Self {
            mutation: Mutex::new(()),
            capacity: AtomicUsize::new(capacity),
            buffer: ArcSwapOption::empty(),
            overspill: sink,
            overspilled: AtomicU64::new(0),
        })
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Returns the number of samples currently retained.
    pub fn len(&self) -> usize {
        self.buffer.load_full().map_or(0, |ring| ring.len())
    }

    /// Returns `true` if no samples are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of samples forwarded to the overspill sink.
    pub fn overspilled(&self) -> u64 {
        self.overspilled.load(Ordering::Relaxed)
    }

    /// Returns the timestamp of the oldest retained sample.
    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.buffer.load_full()?.oldest().map(Sample::timestamp)
    }

    /// Returns the timestamp of the newest retained sample.
    pub fn newest_timestamp(&self) -> Option<i64> {
        self.buffer.load_full()?.newest().map(Sample::timestamp)
    }

    /// Discards every retained sample, returning the archive to EMPTY.
    ///
    /// The configured capacity is kept and the overspill sink is not called.
    pub fn clear(&self) {
        let _guard = self.mutation.lock();
        if let Some(previous) = self.buffer.swap(None) {
            trace!(discarded = previous.len(), "cleared archive buffer");
        }
    }

    /// Hands one evicted sample to the sink. Caller holds `mutation`.
    fn spill(&self, sample: Sample<T>) {
        self.overspilled.fetch_add(1, Ordering::Relaxed);
        self.overspill.accept(sample);
    }
}

impl<T: Clone> Archive<T> {
    /// Accepts a sample as the newest observation.
    ///
    /// Allocates the buffer at the configured capacity if the archive is
    /// EMPTY. If the buffer is full, the oldest sample is evicted and passed
    /// to the overspill sink before this call returns.
    pub fn accept(&self, sample: Sample<T>) {
        let _guard = self.mutation.lock();

        let mut next = match self.buffer.load_full() {
            Some(current) => RingBuffer::clone(&current),
            None => {
                let capacity = self.capacity.load(Ordering::Acquire);
                debug!(capacity, "allocating archive buffer");
                RingBuffer::new(capacity)
            }
        };

        let evicted = next.insert(sample);
        self.buffer.store(Some(Arc::new(next)));

        if let Some(evicted) = evicted {
            self.spill(evicted);
        }
    }

    /// Changes the number of samples retained.
    ///
    /// A no-op if `samples` equals the current capacity. On an ACTIVE archive
    /// the retained samples are replayed, oldest first, into a buffer of the
    /// new capacity; any that no longer fit are forwarded to the overspill
    /// sink in oldest-to-newest order.
    ///
    /// The new buffer and capacity are published before the sink sees any
    /// sample, so a sink that panics cannot leave the archive holding more
    /// than its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCapacity`] if `samples` exceeds
    /// [`MAX_CAPACITY`]. The archive is left unchanged.
    pub fn set_capacity(&self, samples: usize) -> Result<()> {
        validate_capacity(samples)?;

        let _guard = self.mutation.lock();
        let previous = self.capacity.load(Ordering::Acquire);
        if samples == previous {
            return Ok(());
        }

        let Some(current) = self.buffer.load_full() else {
            self.capacity.store(samples, Ordering::Release);
            return Ok(());
        };

        let mut next = RingBuffer::new(samples);
        let evicted: Vec<Sample<T>> = current
            .iter()
            .filter_map(|sample| next.insert(sample.clone()))
            .collect();

        self.buffer.store(Some(Arc::new(next)));
        self.capacity.store(samples, Ordering::Release);
        debug!(
            old_capacity = previous,
            new_capacity = samples,
            overspilled = evicted.len(),
            "migrated archive buffer"
        );

        for sample in evicted {
            self.spill(sample);
        }

        Ok(())
    }

    /// Returns an independent snapshot of all retained samples, oldest to
    /// newest.
    ///
    /// Empty if the archive is EMPTY or holds nothing.
    pub fn get_archive(&self) -> Vec<Sample<T>> {
        self.buffer
            .load_full()
            .map(|ring| ring.snapshot())
            .unwrap_or_default()
    }

    /// Returns an independent snapshot of the retained samples with
    /// `timestamp >= since`, oldest to newest.
    ///
    /// Located by binary search over the retained samples. Empty if no
    /// retained sample is that recent.
    pub fn get_archive_since(&self, since: i64) -> Vec<Sample<T>> {
        match self.buffer.load_full() {
            Some(ring) => ring.snapshot_from(query::since_index(&ring, since)),
            None => Vec::new(),
        }
    }

    /// Like [`get_archive_since`](Self::get_archive_since), with the retained
    /// range and a completeness flag attached.
    pub fn query(&self, since: i64) -> QueryResult<T> {
        let Some(ring) = self.buffer.load_full() else {
            return QueryResult::new(
                Vec::new(),
                since,
                (None, None),
                query::analyze_coverage(None, since, self.overspilled() > 0),
            );
        };

        let oldest = ring.oldest().map(Sample::timestamp);
        let newest = ring.newest().map(Sample::timestamp);
        let samples = ring.snapshot_from(query::since_index(&ring, since));
        let may_be_incomplete = query::analyze_coverage(oldest, since, self.overspilled() > 0);

        QueryResult::new(samples, since, (oldest, newest), may_be_incomplete)
    }

    /// Returns a copy of the newest retained sample.
    pub fn newest(&self) -> Option<Sample<T>> {
        self.buffer.load_full()?.newest().cloned()
    }
}

impl<T: Clone + Send + Sync> OverspillSink<T> for Archive<T> {
    fn accept(&self, sample: Sample<T>) {
        Archive::accept(self, sample);
    }
}

impl<T> fmt::Debug for Archive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("overspilled", &self.overspilled())
            .finish_non_exhaustive()
    }
}
