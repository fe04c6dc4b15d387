//! Configuration types for archive chains.
//!
//! A chain is an ordered list of tiers. The first tier receives every sample;
//! each tier overspills into the next, and the last tier discards. Tier
//! capacities are counted in samples, so a chain retains at most the sum of
//! its capacities.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::archive::MAX_CAPACITY;
use crate::error::{ConfigError, Result};

/// Configuration defining a chain of archives.
///
/// # Example
///
/// ```rust
/// use overspill::config::{ChainConfig, TierConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ChainConfig::new(vec![
///     // Most recent 60 samples
///     TierConfig::new("recent", 60),
///     // The 1440 samples before those
///     TierConfig::new("history", 1440),
/// ])?;
/// assert_eq!(config.total_capacity(), 1500);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Tiers, ordered from the primary (newest samples) to the oldest.
    pub tiers: Vec<TierConfig>,
}

impl ChainConfig {
    /// Creates a validated chain configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid:
    /// - No tiers specified
    /// - A tier has an empty name or a capacity above [`MAX_CAPACITY`]
    /// - Two tiers share a name
    pub fn new(tiers: Vec<TierConfig>) -> Result<Self> {
        let config = Self { tiers };
        config.validate()?;
        Ok(config)
    }

    /// Creates a single-tier configuration named `"primary"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTier`] if `capacity` exceeds
    /// [`MAX_CAPACITY`].
    pub fn single(capacity: usize) -> Result<Self> {
        Self::new(vec![TierConfig::new("primary", capacity)])
    }

    /// Parses and validates a JSON chain configuration.
    ///
    /// The expected shape is
    /// `{"tiers": [{"name": "recent", "capacity": 60}, ...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or any validation
    /// error from [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON chain configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Validates the chain configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(ConfigError::NoTiers.into());
        }

        let mut names = HashSet::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            tier.validate()?;
            if !names.insert(tier.name.as_str()) {
                return Err(ConfigError::DuplicateTier {
                    name: tier.name.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Returns the sum of all tier capacities.
    pub fn total_capacity(&self) -> usize {
        self.tiers.iter().map(|tier| tier.capacity).sum()
    }
}

/// Configuration for a single tier of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierConfig {
    /// Name used to look the tier up.
    pub name: String,

    /// Number of samples the tier retains.
    pub capacity: usize,
}

impl TierConfig {
    /// Creates a tier configuration. Validation happens when the tier is
    /// added to a [`ChainConfig`].
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }

    /// Validates this tier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTier`] if the name is empty or the
    /// capacity exceeds [`MAX_CAPACITY`].
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidTier {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            }
            .into());
        }

        if self.capacity > MAX_CAPACITY {
            return Err(ConfigError::InvalidTier {
                name: self.name.clone(),
                reason: format!("capacity {} exceeds maximum {MAX_CAPACITY}", self.capacity),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverspillError;

    #[test]
    fn test_valid_chain() {
        let config = ChainConfig::new(vec![
            TierConfig::new("recent", 10),
            TierConfig::new("history", 100),
        ])
        .unwrap();

        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.total_capacity(), 110);
    }

    #[test]
    fn test_single() {
        let config = ChainConfig::single(5).unwrap();
        assert_eq!(config.tiers, vec![TierConfig::new("primary", 5)]);
    }

    #[test]
    fn test_zero_capacity_tier_is_valid() {
        assert!(ChainConfig::single(0).is_ok());
    }

    #[test]
    fn test_no_tiers() {
        let result = ChainConfig::new(vec![]);
        assert!(matches!(result, Err(OverspillError::Config(ConfigError::NoTiers))));
    }

    #[test]
    fn test_empty_name() {
        let result = ChainConfig::new(vec![TierConfig::new("  ", 10)]);
        assert!(matches!(
            result,
            Err(OverspillError::Config(ConfigError::InvalidTier { .. }))
        ));
    }

    #[test]
    fn test_capacity_too_large() {
        let result = ChainConfig::single(MAX_CAPACITY + 1);
        assert!(matches!(
            result,
            Err(OverspillError::Config(ConfigError::InvalidTier { .. }))
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let result = ChainConfig::new(vec![
            TierConfig::new("recent", 10),
            TierConfig::new("recent", 20),
        ]);
        match result {
            Err(OverspillError::Config(ConfigError::DuplicateTier { name })) => {
                assert_eq!(name, "recent");
            }
            other => panic!("expected duplicate tier error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_str() {
        let config = ChainConfig::from_json_str(
            r#"{"tiers": [{"name": "recent", "capacity": 3}, {"name": "history", "capacity": 9}]}"#,
        )
        .unwrap();

        assert_eq!(config.tiers[0], TierConfig::new("recent", 3));
        assert_eq!(config.tiers[1], TierConfig::new("history", 9));
    }

    #[test]
    fn test_from_json_str_validates() {
        let result = ChainConfig::from_json_str(r#"{"tiers": []}"#);
        assert!(matches!(result, Err(OverspillError::Config(ConfigError::NoTiers))));
    }

    #[test]
    fn test_from_json_str_malformed() {
        let result = ChainConfig::from_json_str(r#"{"tiers": [{"name": "x"}]}"#);
        assert!(matches!(result, Err(OverspillError::Config(ConfigError::Parse { .. }))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ChainConfig::new(vec![TierConfig::new("a", 1), TierConfig::new("b", 2)]).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ChainConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("chain.json");
        std::fs::write(&path, r#"{"tiers": [{"name": "recent", "capacity": 4}]}"#).unwrap();

        let config = ChainConfig::load(&path).unwrap();
        assert_eq!(config.tiers, vec![TierConfig::new("recent", 4)]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = ChainConfig::load(temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(OverspillError::Config(ConfigError::Read { .. }))));
    }
}
