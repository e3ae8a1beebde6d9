use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::lists::ScanLists;
use crate::core::candidate::Candidate;
use crate::core::types::{MatchResult, Tier};
use crate::matching::engine::SequenceClassifier;
use crate::scan::checkpoint::CheckpointStore;
use crate::scan::state::{ScanIssue, ScanState};
use crate::scan::ScanError;

/// Default number of processed candidates between checkpoints
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 1000;

/// Decides when the controller writes a checkpoint
pub trait CheckpointTrigger {
    /// Called once per processed candidate; true means checkpoint now
    fn tick(&mut self) -> bool;
}

/// Checkpoint after every `n` processed candidates
#[derive(Debug, Clone)]
pub struct EveryN {
    interval: usize,
    count: usize,
}

impl EveryN {
    /// An interval of zero never checkpoints
    pub fn new(interval: usize) -> Self {
        Self { interval, count: 0 }
    }
}

impl CheckpointTrigger for EveryN {
    fn tick(&mut self) -> bool {
        if self.interval == 0 {
            return false;
        }
        self.count += 1;
        self.count % self.interval == 0
    }
}

/// Lifecycle of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    NotStarted,
    Running { resumed: bool },
    Checkpointing,
    Complete,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running { resumed: false } => write!(f, "running"),
            Self::Running { resumed: true } => write!(f, "running (resumed)"),
            Self::Checkpointing => write!(f, "checkpointing"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Processed before the checkpoint this sweep resumed from
    Resumed,
    /// Structure is on the curated ignore list
    Ignored,
    /// Structure was settled by an earlier run
    Known,
    /// Same structure and sequence already classified in this sweep
    Duplicate,
    /// No start motif
    Excluded,
    Classified(Tier),
}

/// Which structures the sweep skips before classification
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    /// Always skipped, even when forced
    pub ignore_structures: BTreeSet<String>,
    /// Accepted or rejected by an earlier run; skipped unless forced
    pub known: BTreeSet<String>,
}

impl ScanFilter {
    pub fn from_lists(lists: &ScanLists) -> Self {
        Self {
            ignore_structures: lists.ignore_structures.clone(),
            known: lists.seen_pdb_codes(),
        }
    }
}

/// Options for one sweep
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Discard any checkpoint and rescan structures settled by earlier runs
    pub force: bool,
}

/// Summary returned when a sweep completes; also written as `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub family: String,
    pub tiers: BTreeMap<Tier, usize>,
    /// Candidates handed to the sweep across every resumed run
    pub candidates: usize,
    pub excluded: usize,
    pub ignored: usize,
    pub known: usize,
    pub duplicate: usize,
    /// Candidates skipped in this run because an earlier run processed them
    pub resumed: usize,
    /// Panel labels never chosen as a best match
    pub unmatched_labels: Vec<String>,
    pub leader_strip_failures: usize,
    pub issues: usize,
    pub checkpoints_written: usize,
    pub completed_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn accepted(&self) -> usize {
        self.tiers
            .iter()
            .filter(|(tier, _)| tier.is_accepted())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Sweeps a candidate set once, routing each chain into a tier.
///
/// Drive it with [`start`](Self::start), one [`process`](Self::process) per
/// candidate and [`finish`](Self::finish), or hand the whole set to
/// [`run`](Self::run).
pub struct ScanController<'a> {
    classifier: &'a SequenceClassifier<'a>,
    store: CheckpointStore,
    filter: ScanFilter,
    options: ScanOptions,
    trigger: Box<dyn CheckpointTrigger + 'a>,
    state: ScanState,
    phase: ScanPhase,
    checkpoints_written: usize,
    resumed: usize,
}

impl<'a> ScanController<'a> {
    pub fn new(
        classifier: &'a SequenceClassifier<'a>,
        store: CheckpointStore,
        filter: ScanFilter,
        options: ScanOptions,
    ) -> Self {
        Self {
            classifier,
            store,
            filter,
            options,
            trigger: Box::new(EveryN::new(DEFAULT_CHECKPOINT_INTERVAL)),
            state: ScanState::new(),
            phase: ScanPhase::NotStarted,
            checkpoints_written: 0,
            resumed: 0,
        }
    }

    /// Replace the checkpoint cadence
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl CheckpointTrigger + 'a) -> Self {
        self.trigger = Box::new(trigger);
        self
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn checkpoints_written(&self) -> usize {
        self.checkpoints_written
    }

    /// Begin the sweep, resuming from a checkpoint unless forced
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidPhase` if already started, or an I/O error
    /// from clearing or reading the checkpoint.
    pub fn start(&mut self) -> Result<ScanPhase, ScanError> {
        if self.phase != ScanPhase::NotStarted {
            return Err(ScanError::InvalidPhase(self.phase));
        }

        let resumed = if self.options.force {
            self.store.clear()?;
            false
        } else if let Some((state, manifest)) = self.store.load()? {
            self.state = state;
            self.checkpoints_written = manifest.sequence;
            true
        } else {
            false
        };

        self.phase = ScanPhase::Running { resumed };
        info!(
            family = self.classifier.panel().family(),
            resumed,
            already_processed = self.state.restart().len(),
            "Scan started"
        );
        Ok(self.phase)
    }

    /// Process one candidate
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidPhase` if the sweep is not running, or an
    /// error from writing a checkpoint. Per-candidate failures are recorded
    /// in the state instead.
    pub fn process(&mut self, candidate: &Candidate) -> Result<CandidateOutcome, ScanError> {
        if !matches!(self.phase, ScanPhase::Running { .. }) {
            return Err(ScanError::InvalidPhase(self.phase));
        }

        if self.state.is_processed(&candidate.structure_id) {
            self.resumed += 1;
            return Ok(CandidateOutcome::Resumed);
        }

        let outcome = self.evaluate(candidate);
        self.state.mark_processed(&candidate.structure_id);

        if self.trigger.tick() {
            self.checkpoint()?;
        }
        Ok(outcome)
    }

    fn evaluate(&mut self, candidate: &Candidate) -> CandidateOutcome {
        let ledger = self.state.ledger_mut();
        ledger.length_matches.push(candidate.structure_id.clone());

        if self.filter.ignore_structures.contains(&candidate.pdb_code) {
            ledger.skipped.ignored += 1;
            return CandidateOutcome::Ignored;
        }
        if !self.options.force && self.filter.known.contains(&candidate.pdb_code) {
            ledger.skipped.known += 1;
            return CandidateOutcome::Known;
        }

        let key = candidate.unique_key();
        if self.state.is_duplicate(&key) {
            self.state.ledger_mut().skipped.duplicate += 1;
            return CandidateOutcome::Duplicate;
        }

        let Some(classification) = self.classifier.classify(candidate) else {
            self.state.ledger_mut().skipped.excluded += 1;
            return CandidateOutcome::Excluded;
        };

        let tier = classification.tier;
        self.state
            .record_start_match(&classification.motif, &candidate.pdb_code);

        let ledger = self.state.ledger_mut();
        ledger
            .construct_types
            .insert(candidate.structure_id.clone(), classification.normalized.construct);
        if classification.normalized.leader_strip_failed() {
            ledger
                .unable_to_split
                .insert(candidate.pdb_code.clone(), candidate.sequence.clone());
        }
        if let Some(label) = &classification.label {
            ledger.matches_used.insert(label.clone());
        }
        if let Some(issue) = classification.structural.as_ref().and_then(|s| s.issue.as_ref()) {
            ledger.issues.push(ScanIssue {
                structure_id: candidate.structure_id.clone(),
                pdb_code: candidate.pdb_code.clone(),
                code: issue.code().to_string(),
                message: issue.to_string(),
            });
        }

        let result: MatchResult = classification.to_match_result(candidate);
        self.state.record(tier, key, result);
        CandidateOutcome::Classified(tier)
    }

    fn checkpoint(&mut self) -> Result<(), ScanError> {
        let resumed = matches!(self.phase, ScanPhase::Running { resumed: true });
        self.phase = ScanPhase::Checkpointing;
        let manifest = self.store.write(&self.state, self.checkpoints_written + 1)?;
        self.checkpoints_written = manifest.sequence;
        self.phase = ScanPhase::Running { resumed };
        info!(
            checkpoint = manifest.sequence,
            processed = manifest.processed,
            classified = self.state.total_classified(),
            "Checkpoint written"
        );
        Ok(())
    }

    /// Write the final tier collections, drop the checkpoint and summarize
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidPhase` if the sweep is not running, or an
    /// error from writing the output.
    pub fn finish(&mut self) -> Result<ScanReport, ScanError> {
        if !matches!(self.phase, ScanPhase::Running { .. }) {
            return Err(ScanError::InvalidPhase(self.phase));
        }

        let ledger = self.state.ledger();
        let unmatched_labels = self
            .classifier
            .panel()
            .labels()
            .filter(|label| !ledger.matches_used.contains(*label))
            .map(str::to_string)
            .collect();

        let report = ScanReport {
            family: self.classifier.panel().family().to_string(),
            tiers: self.state.tier_counts(),
            candidates: ledger.length_matches.len(),
            excluded: ledger.skipped.excluded,
            ignored: ledger.skipped.ignored,
            known: ledger.skipped.known,
            duplicate: ledger.skipped.duplicate,
            resumed: self.resumed,
            unmatched_labels,
            leader_strip_failures: ledger.unable_to_split.len(),
            issues: ledger.issues.len(),
            checkpoints_written: self.checkpoints_written,
            completed_at: Utc::now(),
        };

        self.store.write_final(&self.state, &report)?;
        self.store.clear()?;
        self.phase = ScanPhase::Complete;
        debug!(tiers = ?report.tiers, "Scan complete");
        Ok(report)
    }

    /// Start, process every candidate and finish
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start), [`process`](Self::process) and [`finish`](Self::finish).
    pub fn run<I>(mut self, candidates: I) -> Result<(ScanReport, ScanState), ScanError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        self.start()?;
        for candidate in candidates {
            self.process(&candidate)?;
        }
        let report = self.finish()?;
        Ok((report, self.state))
    }
}
