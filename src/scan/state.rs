use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{ConstructType, MatchResult, Tier};

/// A recovered per-candidate failure, kept as data in the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    pub structure_id: String,
    pub pdb_code: String,
    /// Stable reason code, e.g. `structural_file_missing`
    pub code: String,
    pub message: String,
}

/// Candidates that were seen but never classified
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// No start motif
    pub excluded: usize,
    /// Structure is on the curated ignore list
    pub ignored: usize,
    /// Structure was accepted or rejected by an earlier run
    pub known: usize,
    /// (structure, sequence) pair already classified in this scan
    pub duplicate: usize,
}

/// Everything the scan records besides the tier collections and the restart log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanLedger {
    /// `pdb_code + sequence` keys of every classified chain
    pub unique_matches: BTreeSet<String>,

    /// Structure ids of every candidate handed to the scan, in order
    pub length_matches: Vec<String>,

    /// Start motif -> pdb codes whose chains carried it
    pub start_matches: BTreeMap<String, Vec<String>>,

    /// Structure id -> how its sequence was interpreted
    pub construct_types: BTreeMap<String, ConstructType>,

    /// Pdb code -> sequence, for chains whose leader could not be removed
    pub unable_to_split: BTreeMap<String, String>,

    pub issues: Vec<ScanIssue>,

    /// Panel labels chosen as a best match at least once
    pub matches_used: BTreeSet<String>,

    pub skipped: SkipCounts,
}

/// Accumulated state of one candidate sweep.
///
/// One collection per tier, indexed by [`Tier::index`], plus the ordered
/// restart log of processed candidates used to resume an interrupted sweep.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    tiers: [Vec<MatchResult>; 5],
    restart: Vec<String>,
    processed: HashSet<String>,
    ledger: ScanLedger,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state from its persisted parts
    pub fn from_parts(tiers: [Vec<MatchResult>; 5], restart: Vec<String>, ledger: ScanLedger) -> Self {
        let processed = restart.iter().cloned().collect();
        Self {
            tiers,
            restart,
            processed,
            ledger,
        }
    }

    pub fn tier(&self, tier: Tier) -> &[MatchResult] {
        &self.tiers[tier.index()]
    }

    pub fn tiers(&self) -> impl Iterator<Item = (Tier, &[MatchResult])> {
        Tier::ALL.into_iter().map(|tier| (tier, self.tier(tier)))
    }

    pub fn tier_counts(&self) -> BTreeMap<Tier, usize> {
        self.tiers().map(|(tier, results)| (tier, results.len())).collect()
    }

    pub fn total_classified(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn restart(&self) -> &[String] {
        &self.restart
    }

    pub fn ledger(&self) -> &ScanLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ScanLedger {
        &mut self.ledger
    }

    /// Whether this candidate was processed before the last checkpoint
    pub fn is_processed(&self, structure_id: &str) -> bool {
        self.processed.contains(structure_id)
    }

    pub fn mark_processed(&mut self, structure_id: &str) {
        if self.processed.insert(structure_id.to_string()) {
            self.restart.push(structure_id.to_string());
        }
    }

    pub fn is_duplicate(&self, unique_key: &str) -> bool {
        self.ledger.unique_matches.contains(unique_key)
    }

    /// Route a result into its tier.
    ///
    /// Returns false, and stores nothing, if `unique_key` was already classified.
    pub fn record(&mut self, tier: Tier, unique_key: String, result: MatchResult) -> bool {
        if !self.ledger.unique_matches.insert(unique_key) {
            return false;
        }
        self.tiers[tier.index()].push(result);
        true
    }

    pub fn record_start_match(&mut self, motif: &str, pdb_code: &str) {
        self.ledger
            .start_matches
            .entry(motif.to_string())
            .or_default()
            .push(pdb_code.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_by_tier_and_rejects_duplicates() {
        let mut state = ScanState::new();
        let result = MatchResult::new("1hhk", 1.0, Some("hla_a_02_01".to_string()));

        assert!(state.record(Tier::Exact, "1hhkGSHS".to_string(), result.clone()));
        assert!(!state.record(Tier::Poor, "1hhkGSHS".to_string(), result));
        assert_eq!(state.tier(Tier::Exact).len(), 1);
        assert!(state.tier(Tier::Poor).is_empty());
        assert_eq!(state.total_classified(), 1);
        assert!(state.is_duplicate("1hhkGSHS"));
    }

    #[test]
    fn test_restart_log_keeps_order_once() {
        let mut state = ScanState::new();
        state.mark_processed("1hhk_A");
        state.mark_processed("2bnr_A");
        state.mark_processed("1hhk_A");
        assert_eq!(state.restart(), ["1hhk_A", "2bnr_A"]);
        assert!(state.is_processed("2bnr_A"));
        assert!(!state.is_processed("3abc_A"));
    }

    #[test]
    fn test_from_parts_rebuilds_lookup() {
        let state = ScanState::from_parts(
            Default::default(),
            vec!["1hhk_A".to_string()],
            ScanLedger::default(),
        );
        assert!(state.is_processed("1hhk_A"));
    }

    #[test]
    fn test_tier_counts_cover_every_tier() {
        let mut state = ScanState::new();
        state.record(Tier::Good, "k".to_string(), MatchResult::new("1abc", 0.7, None));
        state.record_start_match("GSHSMRYF", "1abc");
        let counts = state.tier_counts();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&Tier::Good], 1);
        assert_eq!(counts[&Tier::Exact], 0);
        assert_eq!(state.ledger().start_matches["GSHSMRYF"], vec!["1abc"]);
    }
}
