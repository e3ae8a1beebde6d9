use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::MatchResult;
use crate::utils::files::{read_json_or_default, write_json, FileError};

/// Override directory name shared by the scan and the partition step
pub const SCAN_STEP: &str = "scan";

pub const IGNORE_STRUCTURES_FILE: &str = "ignore_structures.json";
pub const KNOWN_MATCHES_FILE: &str = "known_matches.json";
pub const IGNORE_MATCHES_FILE: &str = "ignore_matches.json";
pub const NEW_WORK_FILE: &str = "new_work.json";

/// The list files that carry scan results between runs.
///
/// - `ignore_structures`: curated exclusions (deprecated or crashing entries),
///   never rewritten by the pipeline
/// - `known_matches`: accepted matches from earlier runs
/// - `ignore_matches`: rejected matches from earlier runs
/// - `new_work`: accepted matches not seen before the last partition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanLists {
    pub ignore_structures: BTreeSet<String>,
    pub known_matches: Vec<MatchResult>,
    pub ignore_matches: Vec<MatchResult>,
    pub new_work: Vec<MatchResult>,
}

impl ScanLists {
    /// Directory holding the list files
    pub fn dir(overrides_root: &Path) -> PathBuf {
        overrides_root.join(SCAN_STEP)
    }

    /// Load all lists; any missing file is treated as empty
    ///
    /// # Errors
    ///
    /// Returns `FileError::Parse` if a list file exists but is malformed.
    pub fn load(overrides_root: &Path) -> Result<Self, FileError> {
        let dir = Self::dir(overrides_root);
        let ignore_structures: Vec<String> =
            read_json_or_default(&dir.join(IGNORE_STRUCTURES_FILE))?;
        Ok(Self {
            ignore_structures: ignore_structures
                .into_iter()
                .map(|code| code.to_lowercase())
                .collect(),
            known_matches: read_json_or_default(&dir.join(KNOWN_MATCHES_FILE))?,
            ignore_matches: read_json_or_default(&dir.join(IGNORE_MATCHES_FILE))?,
            new_work: read_json_or_default(&dir.join(NEW_WORK_FILE))?,
        })
    }

    /// Rewrite the three lists the pipeline owns. `ignore_structures` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `FileError` if any list cannot be written.
    pub fn save(&self, overrides_root: &Path) -> Result<(), FileError> {
        let dir = Self::dir(overrides_root);
        write_json(&dir.join(KNOWN_MATCHES_FILE), &self.known_matches)?;
        write_json(&dir.join(IGNORE_MATCHES_FILE), &self.ignore_matches)?;
        write_json(&dir.join(NEW_WORK_FILE), &self.new_work)?;
        Ok(())
    }

    /// PDB codes of every previously accepted or rejected match
    pub fn seen_pdb_codes(&self) -> BTreeSet<String> {
        self.known_matches
            .iter()
            .chain(&self.ignore_matches)
            .map(|m| m.pdb_code.clone())
            .collect()
    }
}
