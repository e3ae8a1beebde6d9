//! Structural alignment fallback.
//!
//! When sequence similarity is inconclusive the classifier asks a
//! [`StructuralAligner`] how much of the canonical alignment region a
//! candidate structure covers. Superposition itself happens out-of-band; the
//! [`AlignmentRecordStore`] reads the per-structure records it produces.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::candidate::Candidate;
use crate::utils::validation::validate_entity_id;

/// Residue ranges (inclusive) of the canonical structure used as the alignment region
pub const CANONICAL_ALIGNMENT_RANGES: [(usize, usize); 6] =
    [(3, 13), (20, 37), (43, 48), (92, 103), (110, 127), (133, 135)];

/// Number of residues in [`CANONICAL_ALIGNMENT_RANGES`]
pub const DEFAULT_DOMAIN_LENGTH: usize = 68;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("No structural alignment record for '{pdb_code}' at {}", path.display())]
    FileNotFound { pdb_code: String, path: PathBuf },

    #[error("Structural alignment record {} is malformed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl AlignError {
    /// Reason code recorded in the scan issue list
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "structural_file_missing",
            Self::Malformed { .. } => "structural_record_malformed",
        }
    }
}

/// Something that can measure a candidate's structural coverage of the canonical domain
pub trait StructuralAligner {
    /// Fraction of the canonical alignment region covered by the candidate's structure, in [0, 1]
    ///
    /// # Errors
    ///
    /// Returns `AlignError` if the structure cannot be aligned; callers treat
    /// this as a coverage of zero.
    fn align(&self, candidate: &Candidate) -> Result<f64, AlignError>;
}

/// Alignment section of the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Residue count of the canonical alignment region
    pub domain_length: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            domain_length: DEFAULT_DOMAIN_LENGTH,
        }
    }
}

/// Superposition statistics, in the order the aligner reports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentInformation {
    pub rmsd: f64,
    pub atom_count: u64,
    pub cycle_count: u64,
    pub starting_rmsd: f64,
    pub starting_atom_count: u64,
    pub match_align_score: f64,
    pub aligned_residue_count: u64,
}

/// One structure's alignment against the canonical structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub filename: String,
    pub alignment_information: AlignmentInformation,
    pub aligned_against: String,
    #[serde(default)]
    pub alignment_residues: Vec<u32>,
}

impl AlignmentRecord {
    /// Aligned residues over `domain_length`, clamped to [0, 1]
    pub fn coverage(&self, domain_length: usize) -> f64 {
        if domain_length == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.alignment_information.aligned_residue_count as f64 / domain_length as f64;
        ratio.clamp(0.0, 1.0)
    }
}

/// Reads alignment records from `{dir}/{pdb_code}.json`
#[derive(Debug, Clone)]
pub struct AlignmentRecordStore {
    dir: PathBuf,
    domain_length: usize,
}

impl AlignmentRecordStore {
    pub fn new(dir: impl Into<PathBuf>, config: &AlignmentConfig) -> Self {
        Self {
            dir: dir.into(),
            domain_length: config.domain_length,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, pdb_code: &str) -> PathBuf {
        self.dir.join(format!("{pdb_code}.json"))
    }

    /// Load the record for `pdb_code`
    ///
    /// # Errors
    ///
    /// Returns `AlignError::FileNotFound` if the record is absent or empty,
    /// and `AlignError::Malformed` if it cannot be parsed.
    pub fn load(&self, pdb_code: &str) -> Result<AlignmentRecord, AlignError> {
        let path = self.record_path(pdb_code);
        let not_found = || AlignError::FileNotFound {
            pdb_code: pdb_code.to_string(),
            path: path.clone(),
        };

        if validate_entity_id(pdb_code).is_err() {
            return Err(not_found());
        }
        let content = std::fs::read_to_string(&path).map_err(|_| not_found())?;
        if content.trim().is_empty() {
            return Err(not_found());
        }
        serde_json::from_str(&content).map_err(|e| AlignError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })
    }
}

impl StructuralAligner for AlignmentRecordStore {
    fn align(&self, candidate: &Candidate) -> Result<f64, AlignError> {
        Ok(self.load(&candidate.pdb_code)?.coverage(self.domain_length))
    }
}

/// Residue numbers in the canonical alignment region
pub fn canonical_residues() -> Vec<u32> {
    CANONICAL_ALIGNMENT_RANGES
        .iter()
        .flat_map(|&(low, high)| low..=high)
        .filter_map(|residue| u32::try_from(residue).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json(aligned: u64) -> String {
        format!(
            r#"{{
                "filename": "1hhk_1.pdb",
                "alignment_information": {{
                    "rmsd": 0.41, "atom_count": 480, "cycle_count": 2,
                    "starting_rmsd": 0.6, "starting_atom_count": 540,
                    "match_align_score": 2300.0, "aligned_residue_count": {aligned}
                }},
                "aligned_against": "1hhk",
                "alignment_residues": [4, 5, 6]
            }}"#
        )
    }

    #[test]
    fn test_domain_length_matches_ranges() {
        assert_eq!(canonical_residues().len(), DEFAULT_DOMAIN_LENGTH);
        assert_eq!(canonical_residues().first(), Some(&3));
        assert_eq!(canonical_residues().last(), Some(&135));
    }

    #[test]
    fn test_coverage_from_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1hhk.json"), record_json(34)).unwrap();
        let store = AlignmentRecordStore::new(dir.path(), &AlignmentConfig::default());

        let candidate = Candidate::from_structure_id("1hhk_A", "GSHS");
        assert!((store.align(&candidate).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_coverage_is_clamped() {
        let record: AlignmentRecord = serde_json::from_str(&record_json(90)).unwrap();
        assert_eq!(record.coverage(68), 1.0);
        assert_eq!(record.coverage(0), 0.0);
    }

    #[test]
    fn test_missing_and_empty_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2bnr.json"), "  \n").unwrap();
        let store = AlignmentRecordStore::new(dir.path(), &AlignmentConfig::default());

        let missing = store.align(&Candidate::from_structure_id("1hhk_A", "GSHS"));
        assert_eq!(missing.unwrap_err().code(), "structural_file_missing");

        let empty = store.align(&Candidate::from_structure_id("2bnr_A", "GSHS"));
        assert_eq!(empty.unwrap_err().code(), "structural_file_missing");
    }

    #[test]
    fn test_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1hhk.json"), r#"{"filename": 3}"#).unwrap();
        let store = AlignmentRecordStore::new(dir.path(), &AlignmentConfig::default());
        let err = store
            .align(&Candidate::from_structure_id("1hhk_A", "GSHS"))
            .unwrap_err();
        assert!(matches!(err, AlignError::Malformed { .. }));
    }
}
