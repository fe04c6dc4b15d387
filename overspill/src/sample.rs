//! Timestamped sample values.

use serde::{Deserialize, Serialize};

/// A single observation: a value paired with the timestamp it was taken at.
///
/// Samples are immutable once constructed. Archives order and search samples
/// by [`timestamp`](Sample::timestamp) alone; the value never takes part in
/// comparisons.
///
/// # Example
///
/// ```rust
/// use overspill::Sample;
///
/// let sample = Sample::new(1_700_000_000_000, 42.5);
/// assert_eq!(sample.timestamp(), 1_700_000_000_000);
/// assert_eq!(*sample.value(), 42.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample<T> {
    timestamp: i64,
    value: T,
}

impl<T> Sample<T> {
    /// Creates a sample taken at `timestamp`.
    pub fn new(timestamp: i64, value: T) -> Self {
        Self { timestamp, value }
    }

    /// Returns the timestamp of this sample.
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns a reference to the sampled value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the sample, returning the sampled value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Consumes the sample, returning `(timestamp, value)`.
    pub fn into_parts(self) -> (i64, T) {
        (self.timestamp, self.value)
    }
}

impl<T> From<(i64, T)> for Sample<T> {
    fn from((timestamp, value): (i64, T)) -> Self {
        Self::new(timestamp, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let sample = Sample::new(-5, "cold");
        assert_eq!(sample.timestamp(), -5);
        assert_eq!(*sample.value(), "cold");
        assert_eq!(sample.into_parts(), (-5, "cold"));
    }

    #[test]
    fn test_from_tuple() {
        let sample: Sample<u64> = (10, 7).into();
        assert_eq!(sample, Sample::new(10, 7));
        assert_eq!(sample.into_value(), 7);
    }

    #[test]
    fn test_json_shape() {
        let sample = Sample::new(1_000, 85.5);
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"timestamp":1000,"value":85.5}"#);

        let parsed: Sample<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample);
    }
}
