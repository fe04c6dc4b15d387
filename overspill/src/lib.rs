//! # overspill
//!
//! Bounded, time-ordered archives for timestamped telemetry samples.
//!
//! overspill keeps the most recent N observations of a value in memory and
//! forwards whatever falls off the end (the *overspill*) to a secondary
//! consumer: another, longer-retention archive or a sink that drops it.
//! Statistics and monitoring code feeds archives from sampling threads and
//! reads snapshots from reporting threads.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Fixed capacity per archive, strict FIFO eviction
//! - Every evicted sample reaches the overspill sink exactly once, in order
//! - Capacity can change at runtime; shrinking overspills the oldest samples
//! - Lock-free snapshot reads; mutations serialized per archive
//! - `since` queries by binary search over the timestamp-ordered contents
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use overspill::{Archive, Sample};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Keep 60 recent samples; spill older ones into a 1440-sample archive
//! let history = Arc::new(Archive::<f64>::new(1440)?);
//! let recent = Archive::with_shared_overspill(60, history.clone())?;
//!
//! // Record observations (timestamps must not decrease)
//! recent.accept(Sample::new(1_640_000_000_000, 85.5));
//! recent.accept(Sample::new(1_640_000_001_000, 87.0));
//!
//! // Read them back
//! for sample in recent.get_archive_since(1_640_000_000_500) {
//!     println!("{}: {}", sample.timestamp(), sample.value());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Archive`]: Bounded archive with lazy allocation and runtime resizing
//! - [`OverspillSink`]: Where evicted samples go
//! - [`ArchiveChain`]: Tiers of archives built from a [`ChainConfig`]
//! - [`Sample`]: Immutable timestamp/value pair
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`archive`]: Archive lifecycle, accept, resize, snapshot reads
//! - [`ring`]: Fixed-capacity ring buffer underneath every archive
//! - [`sink`]: Overspill sink trait and provided sinks
//! - [`chain`]: Multi-tier archive chains
//! - [`config`]: Chain and tier configuration
//! - [`query`]: Binary search and query result types
//! - [`sample`]: Sample type
//! - [`error`]: Error types

pub mod archive;
pub mod chain;
pub mod config;
pub mod error;
pub mod query;
pub mod ring;
pub mod sample;
pub mod sink;

// Re-export primary API types at crate root for convenience.
pub use archive::{Archive, MAX_CAPACITY};
pub use chain::ArchiveChain;
pub use config::{ChainConfig, TierConfig};
pub use error::{OverspillError, Result};
pub use query::QueryResult;
pub use sample::Sample;
pub use sink::{DiscardSink, OverspillSink};
