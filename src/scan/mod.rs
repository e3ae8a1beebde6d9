//! Checkpointed sweep over the candidate set.
//!
//! - [`ScanController`]: drives the sweep and owns its lifecycle
//! - [`ScanState`]: tier collections, restart log and bookkeeping
//! - [`CheckpointStore`]: durable snapshots and final output
//!
//! The sweep moves through `NotStarted -> Running -> (Checkpointing)* ->
//! Complete`. A sweep started over an existing checkpoint enters `Running`
//! in resumed mode and skips every candidate in the checkpoint's restart
//! log. There is no failed state: per-candidate failures are recorded as
//! [`ScanIssue`]s.

pub mod checkpoint;
pub mod controller;
pub mod state;

use std::path::PathBuf;

use thiserror::Error;

use crate::utils::files::FileError;

pub use checkpoint::{CheckpointManifest, CheckpointStore};
pub use controller::{
    CandidateOutcome, CheckpointTrigger, EveryN, ScanController, ScanFilter, ScanOptions,
    ScanPhase, ScanReport,
};
pub use state::{ScanIssue, ScanLedger, ScanState};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint in {} is inconsistent: {reason}", path.display())]
    InconsistentCheckpoint { path: PathBuf, reason: String },

    #[error("Scan cannot do that while {0}")]
    InvalidPhase(ScanPhase),
}
