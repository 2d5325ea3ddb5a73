//! Tunables for extraction and batch processing, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Shipped defaults. Kept in sync with [`ExtractionConfig::default`] by a
/// test.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Window sizes and thresholds used by the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Lines after a position line searched for the occupant and used as
    /// province context.
    pub lookahead_lines: usize,
    /// Leading lines of a document's first page searched for its date.
    pub date_scan_lines: usize,
    /// Minimum number of documents that must yield records for a
    /// comparison to run.
    pub min_documents: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lookahead_lines: 5,
            date_scan_lines: 10,
            min_documents: 2,
        }
    }
}

impl ExtractionConfig {
    /// Parses a TOML document. Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] when `min_documents` is below 2.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        if config.min_documents < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_documents must be at least 2, got {}",
                config.min_documents
            )));
        }
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded extraction config from {}: {config:?}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_defaults_match_default_impl() {
        let config = ExtractionConfig::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ExtractionConfig::from_toml_str("lookahead_lines = 8").unwrap();
        assert_eq!(config.lookahead_lines, 8);
        assert_eq!(config.date_scan_lines, 10);
        assert_eq!(config.min_documents, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ExtractionConfig::from_toml_str("lookahead = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn min_documents_below_two_is_invalid() {
        assert!(matches!(
            ExtractionConfig::from_toml_str("min_documents = 1"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            ExtractionConfig::load(Path::new("/nonexistent/roster_diff.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn read_error_names_the_file() {
        let err = ExtractionConfig::load(Path::new("/nonexistent/roster_diff.toml")).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Failed to read config file /nonexistent/roster_diff.toml: ")
        );
    }
}
