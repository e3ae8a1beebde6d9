//! Group the chains of one structure by sequence similarity.
//!
//! Chains whose pairwise similarity reaches [`ALIKE_THRESHOLD`] are grouped
//! under the first chain of the pair. A structure with two copies of the
//! same complex therefore reports groups like `{A: [A, D], B: [B, E]}` and an
//! assembly count of two.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Map, Value};

use crate::core::candidate::Candidate;
use crate::matching::similarity::BitPattern;
use crate::pipeline::executor::{Action, ActionError, ActionInput, RunRecord};
use crate::pipeline::facet::Facet;
use crate::pipeline::steps::{StepContext, StepError};

pub const STEP: &str = "alike_chains";
pub const FACET: &str = "alike_chains";
pub const ALIKE_THRESHOLD: f64 = 0.95;

const FAILURE_CODE: &str = "unable_to_fetch_or_find_alike_chains";

/// A pair of chains whose sequences are alike
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPair {
    pub first: String,
    pub second: String,
    pub score: f64,
}

/// Chain sequences per structure, in source order
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    chains: BTreeMap<String, Vec<(String, String)>>,
}

impl ChainIndex {
    pub fn from_candidates<'c>(candidates: impl IntoIterator<Item = &'c Candidate>) -> Self {
        let mut chains: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for candidate in candidates {
            let label = candidate
                .chain_label()
                .unwrap_or(candidate.structure_id.as_str())
                .to_string();
            chains
                .entry(candidate.pdb_code.clone())
                .or_default()
                .push((label, candidate.sequence.clone()));
        }
        Self { chains }
    }

    pub fn chains(&self, pdb_code: &str) -> Option<&[(String, String)]> {
        self.chains.get(pdb_code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Every pair of distinct chains at or above the threshold, plus the set of
/// chains that appear in any pair
pub fn match_chains(chains: &[(String, String)]) -> (Vec<ChainPair>, HashSet<String>) {
    let mut pairs = Vec::new();
    let mut matched = HashSet::new();
    for (i, (first, sequence)) in chains.iter().enumerate() {
        let pattern = BitPattern::new(sequence);
        for (second, other) in &chains[i + 1..] {
            let score = pattern.ratio(other);
            if score >= ALIKE_THRESHOLD {
                pairs.push(ChainPair {
                    first: first.clone(),
                    second: second.clone(),
                    score,
                });
                matched.insert(first.clone());
                matched.insert(second.clone());
            }
        }
    }
    (pairs, matched)
}

/// Fold matched pairs into groups keyed by their first chain.
///
/// A pair only extends a group when its first chain already leads one, so a
/// chain linked to a group only through a non-leading member is dropped;
/// the caller detects that by comparing the grouped total to the chain count.
pub fn reorganize(pairs: &[ChainPair]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut grouped = HashSet::new();
    for pair in pairs {
        if !grouped.contains(&pair.first) {
            groups.push((pair.first.clone(), vec![pair.first.clone(), pair.second.clone()]));
            grouped.insert(pair.first.clone());
            grouped.insert(pair.second.clone());
        } else if !grouped.contains(&pair.second) {
            if let Some((_, members)) = groups.iter_mut().find(|(lead, _)| *lead == pair.first) {
                members.push(pair.second.clone());
                grouped.insert(pair.second.clone());
            }
        }
    }
    groups
}

/// Build the facet payload for one structure's chains
///
/// # Errors
///
/// Returns `ActionError::Failed` if there are no chains or the grouping does
/// not account for every chain.
pub fn alike_chains(pdb_code: &str, chains: &[(String, String)]) -> Result<Value, ActionError> {
    if chains.is_empty() {
        return Err(ActionError::failed(FAILURE_CODE, format!("No chains for {pdb_code}")));
    }

    let (pairs, matched) = match_chains(chains);
    let mut groups = reorganize(&pairs);
    for (label, _) in chains {
        if !matched.contains(label) {
            groups.push((label.clone(), vec![label.clone()]));
        }
    }

    let grouped: usize = groups.iter().map(|(_, members)| members.len()).sum();
    if grouped != chains.len() {
        return Err(ActionError::failed(
            FAILURE_CODE,
            format!(
                "Grouped {grouped} of {} chains for {pdb_code}",
                chains.len()
            ),
        ));
    }

    let assembly_count = groups.iter().map(|(_, members)| members.len()).min().unwrap_or(0);
    let chain_groups: Map<String, Value> = groups
        .iter()
        .map(|(lead, members)| (lead.clone(), json!(members)))
        .collect();
    let raw_similarity: Vec<Value> = pairs
        .iter()
        .map(|pair| json!([pair.first, pair.second, pair.score]))
        .collect();
    let chain_sequences: Map<String, Value> = chains
        .iter()
        .map(|(label, sequence)| (label.clone(), json!(sequence)))
        .collect();

    Ok(json!({
        "chains": chain_groups,
        "subunit_count": groups.len(),
        "assembly_count": assembly_count,
        "total_chain_counts": chains.len(),
        "raw_similarity": raw_similarity,
        "chain_sequences": chain_sequences,
    }))
}

pub struct AlikeChainsAction<'i> {
    index: &'i ChainIndex,
}

impl<'i> AlikeChainsAction<'i> {
    pub fn new(index: &'i ChainIndex) -> Self {
        Self { index }
    }
}

impl Action for AlikeChainsAction<'_> {
    fn run(&mut self, input: &ActionInput<'_>) -> Result<Value, ActionError> {
        let chains = self.index.chains(input.entity_id).unwrap_or_default();
        alike_chains(input.entity_id, chains)
    }
}

/// Group chains for every structure in `new_work`
///
/// # Errors
///
/// Returns `StepError` if the lists, overrides or run log cannot be accessed.
pub fn run(ctx: &StepContext, index: &ChainIndex) -> Result<RunRecord, StepError> {
    let items = ctx.new_work()?;
    ctx.execute(
        STEP,
        &Facet::structure(FACET),
        &items,
        &mut AlikeChainsAction::new(index),
        &ctx.options,
    )
}
