//! Chains of archives linked by overspill.
//!
//! An [`ArchiveChain`] owns one [`Archive`] per configured tier. Samples enter
//! the primary tier; whatever a tier evicts is accepted by the next tier, and
//! whatever the last tier evicts is counted and dropped.
//!
//! ```text
//!   accept ──▶ [recent] ──overspill──▶ [history] ──overspill──▶ (discard)
//! ```
//!
//! Because each tier only ever receives samples older than everything in the
//! tiers before it, concatenating tiers from last to first yields one
//! timestamp-ordered sequence.
//!
//! # Consistency
//!
//! Each tier's snapshot is individually consistent, but a read spanning
//! several tiers is not atomic with respect to a concurrent `accept`: a
//! sample in transit between two tiers can be missed by a reader that visits
//! the older tier before the sample arrives there.
//!
//! # Example
//!
//! ```rust
//! use overspill::{ArchiveChain, Sample};
//! use overspill::config::{ChainConfig, TierConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChainConfig::new(vec![
//!     TierConfig::new("recent", 2),
//!     TierConfig::new("history", 3),
//! ])?;
//! let chain = ArchiveChain::<u64>::from_config(&config)?;
//!
//! for ts in 1..=7 {
//!     chain.accept(Sample::new(ts, 0));
//! }
//!
//! let all: Vec<i64> = chain.get_archive().iter().map(Sample::timestamp).collect();
//! assert_eq!(all, vec![3, 4, 5, 6, 7]);
//! assert_eq!(chain.discarded(), 2);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::archive::Archive;
use crate::config::ChainConfig;
use crate::error::{ConfigError, Result};
use crate::query::{self, QueryResult};
use crate::sample::Sample;
use crate::sink::{CountingSink, DiscardSink, OverspillSink};

/// A named tier within a chain.
#[derive(Debug)]
struct Tier<T> {
    name: String,
    archive: Arc<Archive<T>>,
}

/// An ordered set of archives where each tier overspills into the next.
#[derive(Debug)]
pub struct ArchiveChain<T> {
    /// Tiers from primary (newest) to last (oldest).
    tiers: Vec<Tier<T>>,
    /// Final sink; counts samples that leave the chain.
    discarded: Arc<CountingSink<DiscardSink>>,
}

impl<T: Clone + Send + Sync + 'static> ArchiveChain<T> {
    /// Builds a chain from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration does not validate.
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        config.validate()?;

        let discarded = Arc::new(CountingSink::new(DiscardSink));
        let mut next: Arc<dyn OverspillSink<T>> = discarded.clone();
        let mut tiers = Vec::with_capacity(config.tiers.len());

        // Build from the oldest tier so every archive can be handed its sink.
        for tier in config.tiers.iter().rev() {
            let archive = Arc::new(Archive::with_shared_overspill(tier.capacity, next)?);
            next = archive.clone();
            tiers.push(Tier {
                name: tier.name.clone(),
                archive,
            });
        }
        tiers.reverse();

        debug!(
            tiers = tiers.len(),
            total_capacity = config.total_capacity(),
            "built archive chain"
        );

        Ok(Self { tiers, discarded })
    }
}

impl<T> ArchiveChain<T> {
    /// Returns the primary tier, which receives every accepted sample.
    pub fn primary(&self) -> &Archive<T> {
        // from_config rejects empty configurations
        &self.tiers[0].archive
    }

    /// Returns the tier called `name`.
    pub fn tier(&self, name: &str) -> Option<&Archive<T>> {
        self.tiers
            .iter()
            .find(|tier| tier.name == name)
            .map(|tier| tier.archive.as_ref())
    }

    /// Returns the tiers with their names, primary first.
    pub fn tiers(&self) -> impl Iterator<Item = (&str, &Archive<T>)> {
        self.tiers
            .iter()
            .map(|tier| (tier.name.as_str(), tier.archive.as_ref()))
    }

    /// Returns the number of samples that have left the last tier.
    pub fn discarded(&self) -> u64 {
        self.discarded.count()
    }

    /// Returns the number of samples retained across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.iter().map(|tier| tier.archive.len()).sum()
    }

    /// Returns `true` if no tier retains anything.
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|tier| tier.archive.is_empty())
    }

    /// Clears every tier. Nothing is overspilled or counted as discarded.
    pub fn clear(&self) {
        for tier in &self.tiers {
            tier.archive.clear();
        }
    }
}

impl<T: Clone> ArchiveChain<T> {
    /// Accepts a sample into the primary tier.
    pub fn accept(&self, sample: Sample<T>) {
        self.primary().accept(sample);
    }

    /// Changes the capacity of the tier called `name`.
    ///
    /// Samples that no longer fit move on to the next tier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTier`] if no tier has that name, or
    /// [`ArchiveError::InvalidCapacity`](crate::error::ArchiveError::InvalidCapacity)
    /// if `capacity` is too large.
    pub fn set_capacity(&self, name: &str, capacity: usize) -> Result<()> {
        let archive = self.tier(name).ok_or_else(|| ConfigError::UnknownTier {
            name: name.to_string(),
        })?;
        archive.set_capacity(capacity)
    }

    /// Returns every retained sample, oldest to newest, across all tiers.
    pub fn get_archive(&self) -> Vec<Sample<T>> {
        self.tiers
            .iter()
            .rev()
            .flat_map(|tier| tier.archive.get_archive())
            .collect()
    }

    /// Returns every retained sample with `timestamp >= since`, oldest to
    /// newest, across all tiers.
    pub fn get_archive_since(&self, since: i64) -> Vec<Sample<T>> {
        self.tiers
            .iter()
            .rev()
            .flat_map(|tier| tier.archive.get_archive_since(since))
            .collect()
    }

    /// Returns the timestamp of the oldest sample retained by any tier.
    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.tiers
            .iter()
            .rev()
            .find_map(|tier| tier.archive.oldest_timestamp())
    }

    /// Returns the timestamp of the newest sample retained by any tier.
    pub fn newest_timestamp(&self) -> Option<i64> {
        self.tiers
            .iter()
            .find_map(|tier| tier.archive.newest_timestamp())
    }

    /// Returns whether a `since` query may be missing samples that were
    /// discarded off the end of the chain.
    ///
    /// Reads only tier metadata; no samples are copied.
    pub fn may_be_incomplete(&self, since: i64) -> bool {
        query::analyze_coverage(self.oldest_timestamp(), since, self.discarded() > 0)
    }

    /// Like [`get_archive_since`](Self::get_archive_since), with the retained
    /// range of the whole chain and a completeness flag attached.
    pub fn query(&self, since: i64) -> QueryResult<T> {
        let oldest = self.oldest_timestamp();
        let newest = self.newest_timestamp();
        let samples = self.get_archive_since(since);
        let may_be_incomplete = query::analyze_coverage(oldest, since, self.discarded() > 0);

        QueryResult::new(samples, since, (oldest, newest), may_be_incomplete)
    }
}
