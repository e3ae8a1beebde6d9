//! Pipeline configuration.
//!
//! Every field has a default, so an empty `{}` file (or no file at all) is a
//! valid configuration. Command-line flags override whatever is loaded here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::candidate::CandidateQuery;
use crate::matching::{AlignmentConfig, ClassifierConfig, NormalizationConfig, TierThresholds};
use crate::scan::controller::DEFAULT_CHECKPOINT_INTERVAL;
use crate::utils::files::{read_json, FileError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where inputs and outputs live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Facets and scan output
    pub output: PathBuf,
    /// Manual corrections and scan lists
    pub overrides: PathBuf,
    /// Raw per-step run logs
    pub logs: PathBuf,
    /// Per-structure superposition records
    pub alignments: PathBuf,
    pub panel: Option<PathBuf>,
    pub motifs: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output"),
            overrides: PathBuf::from("overrides"),
            logs: PathBuf::from("logs"),
            alignments: PathBuf::from("alignments"),
            panel: None,
            motifs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Molecule family selected from the reference panel
    pub family: String,
    /// Exclusive lower bound on chain length
    pub min_length: usize,
    /// Exclusive upper bound on chain length
    pub max_length: usize,
    /// Candidates between checkpoints; 0 disables checkpointing
    pub checkpoint_interval: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let query = CandidateQuery::default();
        Self {
            family: "class_i".to_string(),
            min_length: query.min_length,
            max_length: query.max_length,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
    pub thresholds: TierThresholds,
    pub normalization: NormalizationConfig,
    pub alignment: AlignmentConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::File` if the file cannot be read or parsed, or
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the defaults
    ///
    /// # Errors
    ///
    /// Same as [`PipelineConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate().map_err(ConfigError::Invalid)?;
        if self.scan.family.trim().is_empty() {
            return Err(ConfigError::Invalid("scan.family must not be empty".to_string()));
        }
        if self.scan.min_length >= self.scan.max_length {
            return Err(ConfigError::Invalid(format!(
                "scan.min_length ({}) must be below scan.max_length ({})",
                self.scan.min_length, self.scan.max_length
            )));
        }
        if self.alignment.domain_length == 0 {
            return Err(ConfigError::Invalid(
                "alignment.domain_length must be positive".to_string(),
            ));
        }
        let n = &self.normalization;
        if n.his_tag.is_empty() {
            return Err(ConfigError::Invalid("normalization.his_tag must not be empty".to_string()));
        }
        if n.mature_length > n.single_chain_above {
            return Err(ConfigError::Invalid(format!(
                "normalization.mature_length ({}) exceeds single_chain_above ({})",
                n.mature_length, n.single_chain_above
            )));
        }
        Ok(())
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            thresholds: self.thresholds.clone(),
            normalization: self.normalization.clone(),
        }
    }

    pub fn candidate_query(&self) -> CandidateQuery {
        CandidateQuery {
            min_length: self.scan.min_length,
            max_length: self.scan.max_length,
        }
    }

    /// Scan output and checkpoints for the configured family
    pub fn scan_dir(&self) -> PathBuf {
        self.paths.output.join("scan").join(&self.scan.family)
    }
}
