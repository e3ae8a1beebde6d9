use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::lists::ScanLists;
use crate::core::types::{MatchResult, Tier};
use crate::pipeline::runlog::RunLog;
use crate::pipeline::steps::StepError;
use crate::scan::checkpoint::load_final_tier;

pub const STEP: &str = "partition";

/// Where each tier's results ended up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    /// Accepted results added to `known_matches` this run
    pub known_matches: usize,
    /// Poor results added to `ignore_matches` this run
    pub ignore_matches: usize,
    /// Size of the rebuilt `new_work` list
    pub new_work: usize,
    /// Possible results awaiting a curator
    pub left_for_review: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub step: String,
    pub run_id: String,
    pub finished_at: DateTime<Utc>,
    pub summary: PartitionSummary,
    pub groupings: BTreeMap<Tier, usize>,
    pub new_work: Vec<String>,
    pub left_for_review: Vec<MatchResult>,
}

fn key(result: &MatchResult) -> (String, Option<String>) {
    (result.pdb_code.clone(), result.structure_id.clone())
}

/// Route tier collections into the scan lists.
///
/// `new_work` is rebuilt from scratch: it holds exactly the accepted
/// results that were not in `known_matches` before this call. Results are
/// identified by pdb code and structure id, so partitioning the same tiers
/// twice adds nothing the second time.
pub fn partition_matches(
    lists: &mut ScanLists,
    tiers: &BTreeMap<Tier, Vec<MatchResult>>,
) -> (PartitionSummary, Vec<MatchResult>) {
    let mut known: HashSet<_> = lists.known_matches.iter().map(key).collect();
    let mut ignored: HashSet<_> = lists.ignore_matches.iter().map(key).collect();
    let mut summary = PartitionSummary::default();
    let mut review = Vec::new();
    lists.new_work.clear();

    for (tier, results) in tiers {
        for result in results {
            if tier.is_accepted() {
                if known.insert(key(result)) {
                    lists.known_matches.push(result.clone());
                    lists.new_work.push(result.clone());
                    summary.known_matches += 1;
                }
            } else if *tier == Tier::Poor {
                if ignored.insert(key(result)) {
                    lists.ignore_matches.push(result.clone());
                    summary.ignore_matches += 1;
                }
            } else {
                review.push(result.clone());
            }
        }
    }

    summary.new_work = lists.new_work.len();
    summary.left_for_review = review.len();
    (summary, review)
}

/// Read the final tier files in `scan_dir` and rewrite the scan lists
///
/// # Errors
///
/// Returns `StepError` if a tier file is malformed or a list or the run log
/// cannot be written.
pub fn run(
    scan_dir: &Path,
    overrides_root: &Path,
    run_log: &RunLog,
) -> Result<PartitionRecord, StepError> {
    let mut tiers = BTreeMap::new();
    for tier in Tier::ALL {
        tiers.insert(tier, load_final_tier(scan_dir, tier)?);
    }

    let mut lists = ScanLists::load(overrides_root)?;
    let (summary, left_for_review) = partition_matches(&mut lists, &tiers);
    lists.save(overrides_root)?;

    let record = PartitionRecord {
        step: STEP.to_string(),
        run_id: run_log.run_id().to_string(),
        finished_at: Utc::now(),
        groupings: tiers.iter().map(|(tier, results)| (*tier, results.len())).collect(),
        new_work: lists.new_work.iter().map(|m| m.pdb_code.clone()).collect(),
        summary,
        left_for_review,
    };
    run_log.write(STEP, &record)?;
    info!(
        new_work = record.summary.new_work,
        known = record.summary.known_matches,
        ignored = record.summary.ignore_matches,
        review = record.summary.left_for_review,
        "Partition complete"
    );
    Ok(record)
}
