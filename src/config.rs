//! Run configuration.
//!
//! An [`ExtractorConfig`] can be built in code, loaded from a JSON file, or
//! assembled by the CLI from flags. A minimal configuration file:
//!
//! ```json
//! {
//!   "barcodes": [
//!     { "sequence": "ACGTACGT", "location": "5", "name": "bc5" },
//!     { "sequence": "TTGGCCAA", "location": "3" }
//!   ],
//!   "max_mismatches": 1,
//!   "output_prefix": "sample"
//! }
//! ```
//!
//! Omitted fields take the values of [`ExtractorConfig::default`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::barcode::{BarcodeError, BarcodeSpec};
use crate::utils::validation::{validate_output_prefix, ValidationError};

pub const DEFAULT_OUTPUT_PREFIX: &str = "barcode_extraction";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No barcodes configured")]
    NoBarcodes,

    #[error(transparent)]
    InvalidBarcode(#[from] BarcodeError),

    #[error("Invalid output prefix '{prefix}': {source}")]
    InvalidPrefix {
        prefix: String,
        #[source]
        source: ValidationError,
    },

    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything one extraction run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Barcodes in search order; the first one found in a read wins
    pub barcodes: Vec<BarcodeSpec>,

    /// Maximum total edits of a match; 0 means exact matching
    pub max_mismatches: usize,

    /// Search only the soft-clipped 5' flank of aligned reads
    pub search_softclipped: bool,

    /// Write reads without a barcode to a `noBarcode` output
    pub keep_unmatched: bool,

    /// Route reads to per-category outputs (statistics are always written)
    pub write_output_files: bool,

    pub output_prefix: String,

    pub output_dir: PathBuf,

    /// Worker threads used for classification
    pub threads: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            barcodes: Vec::new(),
            max_mismatches: 0,
            search_softclipped: false,
            keep_unmatched: true,
            write_output_files: true,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            output_dir: PathBuf::from("."),
            threads: 1,
        }
    }
}

impl ExtractorConfig {
    /// Configuration with the given barcodes and default settings
    #[must_use]
    pub fn new(barcodes: Vec<BarcodeSpec>) -> Self {
        Self {
            barcodes,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Parse` if it is not a valid configuration (including
    /// barcodes with invalid sequences).
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the configuration before any input is opened.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoBarcodes` for an empty barcode list,
    /// `ConfigError::InvalidPrefix` for a prefix that is not a plain file name,
    /// or `ConfigError::ZeroThreads` when `threads` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.barcodes.is_empty() {
            return Err(ConfigError::NoBarcodes);
        }

        validate_output_prefix(&self.output_prefix).map_err(|source| {
            ConfigError::InvalidPrefix {
                prefix: self.output_prefix.clone(),
                source,
            }
        })?;

        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        Ok(())
    }

    /// Barcode sequences configured more than once, in first-repeat order.
    ///
    /// Later copies can never win classification, so they are reported but not
    /// rejected.
    #[must_use]
    pub fn duplicate_barcodes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for barcode in &self.barcodes {
            let sequence = barcode.sequence();
            if !seen.insert(sequence) && !duplicates.contains(&sequence) {
                duplicates.push(sequence);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BarcodeLocation;
    use std::io::Write;

    fn barcode(seq: &str) -> BarcodeSpec {
        BarcodeSpec::new(seq, BarcodeLocation::Unknown).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::new(vec![barcode("ACGT")]);
        assert!(config.keep_unmatched);
        assert!(config.write_output_files);
        assert!(!config.search_softclipped);
        assert_eq!(config.threads, 1);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let empty = ExtractorConfig::default();
        assert!(matches!(empty.validate(), Err(ConfigError::NoBarcodes)));

        let mut prefix = ExtractorConfig::new(vec![barcode("ACGT")]);
        prefix.output_prefix = "../escape".to_string();
        assert!(matches!(
            prefix.validate(),
            Err(ConfigError::InvalidPrefix { .. })
        ));

        let mut threads = ExtractorConfig::new(vec![barcode("ACGT")]);
        threads.threads = 0;
        assert!(matches!(threads.validate(), Err(ConfigError::ZeroThreads)));
    }

    #[test]
    fn test_duplicates_are_reported_once() {
        let config = ExtractorConfig::new(vec![
            barcode("ACGT"),
            barcode("acgt"),
            barcode("TTTT"),
            barcode("ACGT"),
        ]);
        assert_eq!(config.duplicate_barcodes(), vec!["ACGT"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "barcodes": [
                    {{"sequence": "acgtacgt", "location": "5", "name": "bc5"}},
                    {{"sequence": "TTGGCCAA", "location": "three_prime"}}
                ],
                "max_mismatches": 1,
                "keep_unmatched": false,
                "output_prefix": "sample"
            }}"#
        )
        .unwrap();

        let config = ExtractorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.barcodes.len(), 2);
        assert_eq!(config.barcodes[0].sequence(), "ACGTACGT");
        assert_eq!(config.barcodes[0].name(), "bc5");
        assert_eq!(config.barcodes[1].location(), BarcodeLocation::ThreePrime);
        assert_eq!(config.barcodes[1].name(), "TTGGCCAA");
        assert_eq!(config.max_mismatches, 1);
        assert!(!config.keep_unmatched);
        assert!(config.write_output_files);
        assert_eq!(config.output_prefix, "sample");
    }

    #[test]
    fn test_from_json_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"barcodes": [{{"sequence": "ACGU"}}]}}"#).unwrap();
        assert!(matches!(
            ExtractorConfig::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            ExtractorConfig::from_json_file(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
