//! Error types for overspill archives.

use thiserror::Error;

/// The main error type for all overspill operations.
///
/// Archive mutation and query paths fail only on invalid arguments; the
/// configuration layer adds parse and I/O failures.
#[derive(Error, Debug)]
pub enum OverspillError {
    /// Error constructing or resizing an archive.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Error loading or validating a chain configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur when constructing or resizing an archive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The requested capacity exceeds the supported maximum.
    #[error("invalid capacity {capacity}: must be at most {max} samples")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
        /// The maximum capacity allowed.
        max: usize,
    },
}

/// Errors that can occur when loading or validating a chain configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No tiers are configured.
    #[error("at least one tier must be configured")]
    NoTiers,

    /// A tier configuration is invalid.
    #[error("invalid tier '{name}': {reason}")]
    InvalidTier {
        /// The tier name.
        name: String,
        /// Description of what makes the tier invalid.
        reason: String,
    },

    /// Two tiers share a name.
    #[error("tier name '{name}' is used more than once")]
    DuplicateTier {
        /// The duplicated name.
        name: String,
    },

    /// No tier has the requested name.
    #[error("no tier named '{name}'")]
    UnknownTier {
        /// The requested name.
        name: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed as JSON.
    #[error("failed to parse config: {source}")]
    Parse {
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for `Result<T, OverspillError>`.
pub type Result<T> = std::result::Result<T, OverspillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_capacity_message() {
        let err = OverspillError::from(ArchiveError::InvalidCapacity {
            capacity: 100,
            max: 10,
        });
        assert_eq!(
            err.to_string(),
            "archive error: invalid capacity 100: must be at most 10 samples"
        );
    }

    #[test]
    fn test_config_error_wraps() {
        let err = OverspillError::from(ConfigError::DuplicateTier {
            name: "minute".to_string(),
        });
        assert!(matches!(err, OverspillError::Config(ConfigError::DuplicateTier { .. })));
        assert!(err.to_string().contains("'minute'"));
    }
}
