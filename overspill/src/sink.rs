//! Overspill sinks: consumers of samples evicted from an archive.
//!
//! An [`Archive`] hands every sample it evicts to exactly one sink, in
//! eviction order, while holding its mutation lock. Sinks are shared between
//! every thread that mutates the archive, so they take `&self` and must be
//! `Send + Sync`.
//!
//! Provided sinks:
//!
//! - [`DiscardSink`] drops everything (the default)
//! - [`CollectingSink`] keeps everything in memory, mostly for tests and tools
//! - [`CountingSink`] counts samples on their way to an inner sink
//! - [`FnSink`] adapts a closure, see [`from_fn`]
//! - any [`Archive`] is itself a sink, which is how archives are chained
//!
//! [`Archive`]: crate::archive::Archive

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::sample::Sample;

/// A capability consuming samples evicted from an archive.
///
/// Implementations are called synchronously from whichever thread holds the
/// evicting archive's mutation lock. A sink that forwards into shared state
/// must synchronize that state itself.
pub trait OverspillSink<T>: Send + Sync {
    /// Consumes one evicted sample.
    fn accept(&self, sample: Sample<T>);
}

impl<T, S: OverspillSink<T> + ?Sized> OverspillSink<T> for Arc<S> {
    fn accept(&self, sample: Sample<T>) {
        (**self).accept(sample);
    }
}

impl<T, S: OverspillSink<T> + ?Sized> OverspillSink<T> for Box<S> {
    fn accept(&self, sample: Sample<T>) {
        (**self).accept(sample);
    }
}

/// A sink that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<T> OverspillSink<T> for DiscardSink {
    #[inline]
    fn accept(&self, _sample: Sample<T>) {}
}

/// A sink that retains every sample it receives, in arrival order.
#[derive(Debug)]
pub struct CollectingSink<T> {
    samples: Mutex<Vec<Sample<T>>>,
}

impl<T> CollectingSink<T> {
    /// Creates an empty collecting sink.
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of samples received so far.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Returns `true` if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Removes and returns everything received so far.
    pub fn take(&self) -> Vec<Sample<T>> {
        std::mem::take(&mut *self.samples.lock())
    }
}

impl<T> Default for CollectingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> CollectingSink<T> {
    /// Returns a copy of everything received so far.
    pub fn samples(&self) -> Vec<Sample<T>> {
        self.samples.lock().clone()
    }
}

impl<T: Send> OverspillSink<T> for CollectingSink<T> {
    fn accept(&self, sample: Sample<T>) {
        self.samples.lock().push(sample);
    }
}

/// A sink that counts samples before passing them to an inner sink.
#[derive(Debug, Default)]
pub struct CountingSink<S> {
    inner: S,
    count: AtomicU64,
}

impl<S> CountingSink<S> {
    /// Wraps `inner`, starting the count at zero.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            count: AtomicU64::new(0),
        }
    }

    /// Returns how many samples have passed through.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Returns the wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<T, S: OverspillSink<T>> OverspillSink<T> for CountingSink<S> {
    fn accept(&self, sample: Sample<T>) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.inner.accept(sample);
    }
}

/// A sink backed by a closure. Created with [`from_fn`].
#[derive(Clone)]
pub struct FnSink<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

impl<T, F> OverspillSink<T> for FnSink<F>
where
    F: Fn(Sample<T>) + Send + Sync,
{
    fn accept(&self, sample: Sample<T>) {
        (self.f)(sample);
    }
}

/// Creates a sink that calls `f` with every evicted sample.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use overspill::{Archive, Sample, sink};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// static LAST: AtomicI64 = AtomicI64::new(0);
///
/// let archive = Archive::with_overspill(1, sink::from_fn(|s: Sample<u8>| {
///     LAST.store(s.timestamp(), Ordering::Relaxed);
/// }))?;
/// archive.accept(Sample::new(1, 0));
/// archive.accept(Sample::new(2, 0));
/// assert_eq!(LAST.load(Ordering::Relaxed), 1);
/// # Ok(())
/// # }
/// ```
pub fn from_fn<T, F>(f: F) -> FnSink<F>
where
    F: Fn(Sample<T>) + Send + Sync,
{
    FnSink { f }
}
