//! Time-indexed read path for overspill archives.
//!
//! Archives keep samples in insertion order, which callers guarantee is
//! non-decreasing in timestamp. That makes every snapshot sorted, so "samples
//! since `t`" is a suffix found by binary search rather than a filter.
//!
//! This module holds the search primitives shared by [`Archive`] and
//! [`ArchiveChain`], plus [`QueryResult`], which carries the retained samples
//! along with metadata about how much of the requested range they cover.
//!
//! # Duplicate timestamps
//!
//! The search always lands on the *first* sample whose timestamp is
//! `>= since`, so a query for `t` includes every retained sample stamped `t`.
//!
//! [`Archive`]: crate::archive::Archive
//! [`ArchiveChain`]: crate::chain::ArchiveChain

use crate::ring::RingBuffer;
use crate::sample::Sample;

/// Returns the logical index of the first sample in `ring` with
/// `timestamp >= since`, or `ring.len()` if there is none.
///
/// Assumes the ring is sorted by timestamp; does not validate it.
pub fn since_index<T>(ring: &RingBuffer<Sample<T>>, since: i64) -> usize {
    let (mut low, mut high) = (0, ring.len());
    while low < high {
        let mid = low + (high - low) / 2;
        match ring.get(mid) {
            Some(sample) if sample.timestamp() < since => low = mid + 1,
            _ => high = mid,
        }
    }
    low
}

/// Determines whether a `since` query may be missing samples.
///
/// # Arguments
///
/// * `oldest` - Oldest retained timestamp (None if nothing is retained)
/// * `since` - Start of the requested range
/// * `discarded` - Whether any sample has ever left the retention chain
///
/// # Returns
///
/// `true` when samples at or after `since` could have been discarded: the
/// request reaches back before the oldest retained sample and something has
/// been dropped.
pub fn analyze_coverage(oldest: Option<i64>, since: i64, discarded: bool) -> bool {
    match oldest {
        Some(oldest_ts) => discarded && since < oldest_ts,
        None => discarded,
    }
}

/// Result of a `since` query over an archive or archive chain.
///
/// Owns an independent, oldest-to-newest copy of the matching samples and
/// reports the retained range and whether data may be incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Matching samples, oldest to newest.
    samples: Vec<Sample<T>>,

    /// The `since` bound that was requested.
    since: i64,

    /// The retained time range at query time (oldest, newest).
    available_range: (Option<i64>, Option<i64>),

    /// Whether samples in the requested range may have been discarded.
    may_be_incomplete: bool,
}

impl<T> QueryResult<T> {
    /// Creates a new query result.
    ///
    /// # Arguments
    ///
    /// * `samples` - Matching samples, oldest to newest
    /// * `since` - The requested lower bound
    /// * `available_range` - The retained range (oldest, newest)
    /// * `may_be_incomplete` - Whether data may be missing
    pub fn new(
        samples: Vec<Sample<T>>,
        since: i64,
        available_range: (Option<i64>, Option<i64>),
        may_be_incomplete: bool,
    ) -> Self {
        Self {
            samples,
            since,
            available_range,
            may_be_incomplete,
        }
    }

    /// Returns the matching samples, oldest to newest.
    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    /// Returns the requested lower bound.
    pub fn since(&self) -> i64 {
        self.since
    }

    /// Returns the retained time range at query time.
    ///
    /// Returns `(oldest_timestamp, newest_timestamp)`; both are `None` when
    /// nothing was retained.
    pub fn available_range(&self) -> (Option<i64>, Option<i64>) {
        self.available_range
    }

    /// Returns whether the result may be missing samples at or after
    /// [`since`](Self::since) because they were discarded.
    pub fn may_be_incomplete(&self) -> bool {
        self.may_be_incomplete
    }

    /// Returns the number of matching samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples matched.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consumes the result, returning the matching samples.
    pub fn into_samples(self) -> Vec<Sample<T>> {
        self.samples
    }
}

impl<T> IntoIterator for QueryResult<T> {
    type Item = Sample<T>;
    type IntoIter = std::vec::IntoIter<Sample<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
