//! Durable scan snapshots.
//!
//! Layout under the scan directory:
//!
//! ```text
//! {scan_dir}/
//!   checkpoint/            last sealed checkpoint
//!     tmp_exact.json ... tmp_poor.json
//!     tmp_restart.json
//!     tmp_state.json
//!     tmp_manifest.json    written last; a directory without it is never read
//!   checkpoint.partial/    checkpoint being staged
//!   checkpoint.old/        previous checkpoint, only present mid-swap
//!   exact.json ... poor.json, scan_details.json, summary.json   final output
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::types::{MatchResult, Tier};
use crate::scan::state::{ScanLedger, ScanState};
use crate::scan::ScanError;
use crate::utils::files::{read_json, read_json_or_default, write_json};

const CHECKPOINT_DIR: &str = "checkpoint";
const PARTIAL_DIR: &str = "checkpoint.partial";
const OLD_DIR: &str = "checkpoint.old";

const MANIFEST_FILE: &str = "tmp_manifest.json";
const RESTART_FILE: &str = "tmp_restart.json";
const STATE_FILE: &str = "tmp_state.json";

pub const SUMMARY_FILE: &str = "summary.json";
pub const DETAILS_FILE: &str = "scan_details.json";

/// Seals a checkpoint directory and describes what it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointManifest {
    /// Number of checkpoints written in this sweep, starting at 1
    pub sequence: usize,
    pub processed: usize,
    pub tiers: BTreeMap<Tier, usize>,
    pub written_at: DateTime<Utc>,
}

/// Where one tier's checkpoint collection is staged
fn checkpoint_tier_file(tier: Tier) -> String {
    format!("tmp_{tier}.json")
}

/// Final tier collection file name
pub fn tier_file(tier: Tier) -> String {
    format!("{tier}.json")
}

/// Reads and writes checkpoints and final output for one scan directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    scan_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(scan_dir: impl Into<PathBuf>) -> Self {
        Self {
            scan_dir: scan_dir.into(),
        }
    }

    pub fn scan_dir(&self) -> &Path {
        &self.scan_dir
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.scan_dir.join(CHECKPOINT_DIR)
    }

    /// Stage a full snapshot of `state` and swap it in as the current checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if any file or directory operation fails. The
    /// previous checkpoint stays readable until the new one is sealed.
    pub fn write(&self, state: &ScanState, sequence: usize) -> Result<CheckpointManifest, ScanError> {
        let partial = self.scan_dir.join(PARTIAL_DIR);
        remove_dir_if_exists(&partial)?;
        create_dir(&partial)?;

        for (tier, results) in state.tiers() {
            write_json(&partial.join(checkpoint_tier_file(tier)), results)?;
        }
        write_json(&partial.join(RESTART_FILE), state.restart())?;
        write_json(&partial.join(STATE_FILE), state.ledger())?;

        let manifest = CheckpointManifest {
            sequence,
            processed: state.restart().len(),
            tiers: state.tier_counts(),
            written_at: Utc::now(),
        };
        write_json(&partial.join(MANIFEST_FILE), &manifest)?;

        let current = self.checkpoint_dir();
        let old = self.scan_dir.join(OLD_DIR);
        remove_dir_if_exists(&old)?;
        if current.exists() {
            rename(&current, &old)?;
        }
        rename(&partial, &current)?;
        remove_dir_if_exists(&old)?;

        debug!(sequence, processed = manifest.processed, "Checkpoint sealed");
        Ok(manifest)
    }

    /// Load the most recent sealed checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InconsistentCheckpoint` if a sealed checkpoint
    /// disagrees with its manifest, or `ScanError::File` if it cannot be read.
    pub fn load(&self) -> Result<Option<(ScanState, CheckpointManifest)>, ScanError> {
        for dir in [self.checkpoint_dir(), self.scan_dir.join(OLD_DIR)] {
            if dir.join(MANIFEST_FILE).is_file() {
                return self.load_from(&dir).map(Some);
            }
        }
        Ok(None)
    }

    fn load_from(&self, dir: &Path) -> Result<(ScanState, CheckpointManifest), ScanError> {
        let manifest: CheckpointManifest = read_json(&dir.join(MANIFEST_FILE))?;
        let mut tiers: [Vec<MatchResult>; 5] = Default::default();
        for tier in Tier::ALL {
            let results: Vec<MatchResult> = read_json(&dir.join(checkpoint_tier_file(tier)))?;
            let expected = manifest.tiers.get(&tier).copied().unwrap_or(0);
            if results.len() != expected {
                return Err(ScanError::InconsistentCheckpoint {
                    path: dir.to_path_buf(),
                    reason: format!(
                        "{tier} holds {} results, manifest says {expected}",
                        results.len()
                    ),
                });
            }
            tiers[tier.index()] = results;
        }
        let restart: Vec<String> = read_json(&dir.join(RESTART_FILE))?;
        if restart.len() != manifest.processed {
            return Err(ScanError::InconsistentCheckpoint {
                path: dir.to_path_buf(),
                reason: format!(
                    "restart log holds {} candidates, manifest says {}",
                    restart.len(),
                    manifest.processed
                ),
            });
        }
        let ledger: ScanLedger = read_json(&dir.join(STATE_FILE))?;

        info!(
            sequence = manifest.sequence,
            processed = manifest.processed,
            "Resuming from checkpoint"
        );
        Ok((ScanState::from_parts(tiers, restart, ledger), manifest))
    }

    /// Remove every checkpoint directory
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Io` if a directory cannot be removed.
    pub fn clear(&self) -> Result<(), ScanError> {
        for name in [CHECKPOINT_DIR, PARTIAL_DIR, OLD_DIR] {
            remove_dir_if_exists(&self.scan_dir.join(name))?;
        }
        Ok(())
    }

    /// Write the final tier collections, the scan details and `summary`
    ///
    /// # Errors
    ///
    /// Returns `ScanError::File` if any document cannot be written.
    pub fn write_final<S: Serialize>(&self, state: &ScanState, summary: &S) -> Result<(), ScanError> {
        for (tier, results) in state.tiers() {
            write_json(&self.scan_dir.join(tier_file(tier)), results)?;
        }
        write_json(&self.scan_dir.join(DETAILS_FILE), state.ledger())?;
        write_json(&self.scan_dir.join(SUMMARY_FILE), summary)?;
        Ok(())
    }
}

/// Read a final tier collection; a missing file is an empty tier
///
/// # Errors
///
/// Returns `ScanError::File` if the file exists but cannot be parsed.
pub fn load_final_tier(scan_dir: &Path, tier: Tier) -> Result<Vec<MatchResult>, ScanError> {
    Ok(read_json_or_default(&scan_dir.join(tier_file(tier)))?)
}

fn create_dir(path: &Path) -> Result<(), ScanError> {
    std::fs::create_dir_all(path).map_err(|source| ScanError::Io {
        action: "create",
        path: path.to_path_buf(),
        source,
    })
}

fn rename(from: &Path, to: &Path) -> Result<(), ScanError> {
    std::fs::rename(from, to).map_err(|source| ScanError::Io {
        action: "rename",
        path: from.to_path_buf(),
        source,
    })
}

fn remove_dir_if_exists(path: &Path) -> Result<(), ScanError> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(ScanError::Io {
            action: "remove",
            path: path.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}
