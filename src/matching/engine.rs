use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::panel::{ReferenceEntry, ReferencePanel};
use crate::core::candidate::Candidate;
use crate::core::types::{ConstructType, MatchResult, Tier};
use crate::matching::alignment::{AlignError, StructuralAligner};
use crate::matching::normalize::{normalize, strip_his_tags, NormalizationConfig, Normalized};
use crate::matching::scoring::{FuzzyDecision, TierThresholds};
use crate::matching::similarity::BitPattern;

/// Configuration for the sequence classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub thresholds: TierThresholds,
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

/// Result of the structural fallback for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralCheck {
    /// Coverage of the canonical alignment region; 0 when alignment failed
    pub ratio: f64,
    pub issue: Option<AlignError>,
}

/// Full outcome of classifying one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tier: Tier,

    /// Best similarity across the panel
    pub score: f64,

    /// Best-matching reference, if any reference scored above zero
    pub label: Option<String>,
    pub matched_to: Option<String>,

    /// The start motif that let the candidate through the pre-filter
    pub motif: String,

    /// The sequence actually compared against the panel
    pub normalized: Normalized,

    /// Only present when similarity was inconclusive
    pub structural: Option<StructuralCheck>,
}

impl Classification {
    pub fn to_match_result(&self, candidate: &Candidate) -> MatchResult {
        MatchResult::new(&candidate.pdb_code, self.score, self.matched_to.clone())
            .with_structure_id(&candidate.structure_id)
    }
}

/// A reference prepared for repeated comparison
struct PreparedReference {
    full: BitPattern,
    truncated: BitPattern,
}

/// Classifies candidate chains against a reference panel.
///
/// Reference patterns are prepared once, so one classifier should be reused
/// across a whole scan.
pub struct SequenceClassifier<'a> {
    panel: &'a ReferencePanel,
    aligner: &'a dyn StructuralAligner,
    config: ClassifierConfig,
    prepared: Vec<PreparedReference>,
}

impl<'a> SequenceClassifier<'a> {
    /// Create a classifier with default thresholds and length cut-offs
    pub fn new(panel: &'a ReferencePanel, aligner: &'a dyn StructuralAligner) -> Self {
        Self::with_config(panel, aligner, ClassifierConfig::default())
    }

    pub fn with_config(
        panel: &'a ReferencePanel,
        aligner: &'a dyn StructuralAligner,
        config: ClassifierConfig,
    ) -> Self {
        let clip = config.normalization.truncated_reference_length;
        let prepared = panel
            .entries()
            .iter()
            .map(|entry| PreparedReference {
                full: BitPattern::new(&entry.sequence),
                truncated: BitPattern::new(entry.sequence.get(..clip).unwrap_or(&entry.sequence)),
            })
            .collect();
        Self {
            panel,
            aligner,
            config,
            prepared,
        }
    }

    pub fn panel(&self) -> &ReferencePanel {
        self.panel
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one candidate.
    ///
    /// Returns None when the candidate carries no start motif; such a
    /// candidate is excluded rather than assigned a tier.
    pub fn classify(&self, candidate: &Candidate) -> Option<Classification> {
        let Some(hit) = self.panel.find_start_motif(&candidate.sequence) else {
            debug!(structure_id = %candidate.structure_id, "No start motif");
            return None;
        };
        let motif = hit.motif.to_string();

        let normalized = normalize(&candidate.sequence, self.panel, &self.config.normalization);
        let untagged = strip_his_tags(&candidate.sequence, &self.config.normalization.his_tag);
        let (score, best) = match self.identical_reference(&untagged) {
            Some(entry) => (1.0, Some(entry)),
            None => {
                let truncated = normalized.construct == ConstructType::Truncated;
                self.best_match(&normalized.sequence, truncated)
            }
        };

        let (tier, structural) = match self.config.thresholds.fuzzy_decision(score) {
            FuzzyDecision::Tier(tier) => (tier, None),
            FuzzyDecision::Escalate => {
                let check = self.structural_check(candidate);
                let tier = self.config.thresholds.fallback_tier(score, check.ratio);
                (tier, Some(check))
            }
        };

        debug!(
            structure_id = %candidate.structure_id,
            %tier,
            score,
            construct = %normalized.construct,
            "Classified"
        );

        Some(Classification {
            tier,
            score,
            label: best.map(|entry| entry.label.clone()),
            matched_to: best.map(|entry| entry.slug.clone()),
            motif,
            normalized,
            structural,
        })
    }

    /// First reference identical to the untagged candidate.
    ///
    /// Checked before any length-based clipping, which would otherwise keep
    /// a short or long reference from ever matching itself.
    fn identical_reference(&self, sequence: &str) -> Option<&'a ReferenceEntry> {
        self.panel
            .entries()
            .iter()
            .find(|entry| entry.sequence == sequence)
    }

    /// Best score over the panel and the first reference reaching it.
    ///
    /// Stops at the first identical reference.
    fn best_match(&self, sequence: &str, truncated: bool) -> (f64, Option<&'a ReferenceEntry>) {
        let mut best_score = 0.0;
        let mut best = None;
        for (entry, prepared) in self.panel.entries().iter().zip(&self.prepared) {
            let pattern = if truncated {
                &prepared.truncated
            } else {
                &prepared.full
            };
            let score = pattern.ratio(sequence);
            if score > best_score {
                best_score = score;
                best = Some(entry);
                if score >= 1.0 {
                    break;
                }
            }
        }
        (best_score, best)
    }

    fn structural_check(&self, candidate: &Candidate) -> StructuralCheck {
        match self.aligner.align(candidate) {
            Ok(ratio) => StructuralCheck { ratio, issue: None },
            Err(e) => {
                warn!(structure_id = %candidate.structure_id, "{e}");
                StructuralCheck {
                    ratio: 0.0,
                    issue: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::matching::normalize::LeaderStrip;
    use std::cell::Cell;
    use std::path::PathBuf;

    pub(crate) const MOTIF: &str = "GSHSMRYF";

    /// Deterministic residue filler without histidines
    pub(crate) fn pseudo_sequence(seed: u64, len: usize) -> String {
        const RESIDUES: &[u8] = b"ACDEFGIKLMNPQRSTVWY";
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                RESIDUES[((state >> 33) % RESIDUES.len() as u64) as usize] as char
            })
            .collect()
    }

    /// A 275-residue reference beginning with the motif
    pub(crate) fn reference(seed: u64) -> String {
        format!("{MOTIF}{}", pseudo_sequence(seed, 267))
    }

    pub(crate) fn panel() -> ReferencePanel {
        ReferencePanel::new(
            "class_i",
            vec![
                ReferenceEntry::new("HLA-B*27:05", reference(1)),
                ReferenceEntry::new("HLA-A*02:01", reference(2)),
            ],
            vec![MOTIF.to_string()],
        )
        .unwrap()
    }

    /// Aligner returning a fixed ratio and counting calls
    pub(crate) struct CountingAligner {
        pub ratio: Option<f64>,
        pub calls: Cell<usize>,
    }

    impl CountingAligner {
        pub(crate) fn new(ratio: Option<f64>) -> Self {
            Self {
                ratio,
                calls: Cell::new(0),
            }
        }
    }

    impl StructuralAligner for CountingAligner {
        fn align(&self, candidate: &Candidate) -> Result<f64, AlignError> {
            self.calls.set(self.calls.get() + 1);
            self.ratio.ok_or_else(|| AlignError::FileNotFound {
                pdb_code: candidate.pdb_code.clone(),
                path: PathBuf::from(format!("{}.json", candidate.pdb_code)),
            })
        }
    }

    #[test]
    fn test_exact_match_after_his_tag_strip() {
        let panel = panel();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);

        let candidate = Candidate::from_structure_id("1hhk_A", format!("{}HHHHHH", reference(2)));
        let result = classifier.classify(&candidate).unwrap();
        assert_eq!(result.tier, Tier::Exact);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.matched_to.as_deref(), Some("hla_a_02_01"));
        assert_eq!(result.label.as_deref(), Some("HLA-A*02:01"));
        assert_eq!(aligner.calls.get(), 0);
    }

    #[test]
    fn test_exact_match_regardless_of_panel_position() {
        let panel = ReferencePanel::new(
            "class_i",
            vec![
                ReferenceEntry::new("near", format!("{}W", reference(3))),
                ReferenceEntry::new("identical", reference(3)),
            ],
            vec![MOTIF.to_string()],
        )
        .unwrap();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);

        let result = classifier
            .classify(&Candidate::from_structure_id("1abc_A", reference(3)))
            .unwrap();
        assert_eq!(result.tier, Tier::Exact);
        assert_eq!(result.label.as_deref(), Some("identical"));
    }

    fn single_reference_classifier_result(sequence: String) -> (Classification, usize) {
        let panel = ReferencePanel::new(
            "class_i",
            vec![ReferenceEntry::new("HLA-E*01:01", sequence.clone())],
            vec![MOTIF.to_string()],
        )
        .unwrap();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);
        let result = classifier
            .classify(&Candidate::from_structure_id("6abc_A", sequence))
            .unwrap();
        (result, aligner.calls.get())
    }

    #[test]
    fn test_short_reference_matches_itself_exactly() {
        let (result, calls) =
            single_reference_classifier_result(format!("{MOTIF}{}", pseudo_sequence(21, 182)));
        assert_eq!(result.normalized.construct, ConstructType::Truncated);
        assert_eq!(result.tier, Tier::Exact);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.label.as_deref(), Some("HLA-E*01:01"));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_long_reference_matches_itself_exactly() {
        let (result, calls) =
            single_reference_classifier_result(format!("{MOTIF}{}", pseudo_sequence(22, 292)));
        assert_eq!(result.normalized.leader, LeaderStrip::Stripped);
        assert_eq!(result.tier, Tier::Exact);
        assert_eq!(result.score, 1.0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_identity_is_checked_after_tag_removal() {
        let sequence = format!("{MOTIF}{}", pseudo_sequence(23, 182));
        let panel = ReferencePanel::new(
            "class_i",
            vec![ReferenceEntry::new("HLA-E*01:01", sequence.clone())],
            vec![MOTIF.to_string()],
        )
        .unwrap();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);
        let result = classifier
            .classify(&Candidate::from_structure_id("6abc_B", format!("HHHHHH{sequence}")))
            .unwrap();
        assert_eq!(result.tier, Tier::Exact);
    }

    #[test]
    fn test_first_reference_wins_ties() {
        let panel = ReferencePanel::new(
            "class_i",
            vec![
                ReferenceEntry::new("first", reference(4)),
                ReferenceEntry::new("second", reference(4)),
            ],
            vec![MOTIF.to_string()],
        )
        .unwrap();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);

        let mut mutated = reference(4);
        mutated.push_str("KK");
        let result = classifier
            .classify(&Candidate::from_structure_id("1abc_A", mutated))
            .unwrap();
        assert_eq!(result.label.as_deref(), Some("first"));
    }

    #[test]
    fn test_no_motif_is_excluded() {
        let panel = panel();
        let aligner = CountingAligner::new(Some(1.0));
        let classifier = SequenceClassifier::new(&panel, &aligner);
        let candidate = Candidate::from_structure_id("9xyz_A", pseudo_sequence(50, 250));
        assert!(classifier.classify(&candidate).is_none());
        assert_eq!(aligner.calls.get(), 0);
    }

    #[test]
    fn test_truncated_construct_scores_good() {
        // 150 residues: the motif plus 91 reference residues and 51 foreign
        // ones; LCS 99 against the 180-residue clipped reference gives 0.6
        let shared = &reference(2)[..99];
        let sequence = format!("{shared}{}", "X".repeat(51));
        let panel = ReferencePanel::new(
            "class_i",
            vec![ReferenceEntry::new("HLA-A*02:01", reference(2))],
            vec![MOTIF.to_string()],
        )
        .unwrap();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);

        let result = classifier
            .classify(&Candidate::from_structure_id("5abc_A", sequence))
            .unwrap();
        assert_eq!(result.normalized.construct, ConstructType::Truncated);
        assert!((result.score - 0.6).abs() < 1e-12);
        assert_eq!(result.tier, Tier::Good);
        assert_eq!(aligner.calls.get(), 0);
    }

    #[test]
    fn test_structural_fallback_only_for_low_scores() {
        let panel = panel();
        let aligner = CountingAligner::new(Some(0.9));
        let classifier = SequenceClassifier::new(&panel, &aligner);

        // Motif followed by unrelated residues
        let weak = format!("{MOTIF}{}", pseudo_sequence(77, 260));
        let result = classifier
            .classify(&Candidate::from_structure_id("7abc_A", weak))
            .unwrap();
        assert!(result.score <= 0.5);
        assert_eq!(aligner.calls.get(), 1);
        assert_eq!(result.tier, Tier::Possible);
        assert_eq!(result.structural.as_ref().unwrap().ratio, 0.9);

        let strong = format!("{}HHHHHH", reference(1));
        classifier
            .classify(&Candidate::from_structure_id("1hhk_A", strong))
            .unwrap();
        assert_eq!(aligner.calls.get(), 1);
    }

    #[test]
    fn test_missing_structure_is_recorded_not_fatal() {
        let panel = panel();
        let aligner = CountingAligner::new(None);
        let classifier = SequenceClassifier::new(&panel, &aligner);

        let weak = format!("{MOTIF}{}", "W".repeat(260));
        let result = classifier
            .classify(&Candidate::from_structure_id("8abc_A", weak))
            .unwrap();
        let check = result.structural.unwrap();
        assert_eq!(check.ratio, 0.0);
        assert_eq!(check.issue.unwrap().code(), "structural_file_missing");
        assert_eq!(result.tier, Tier::Poor);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let panel = panel();
        let aligner = CountingAligner::new(Some(0.2));
        let classifier = SequenceClassifier::new(&panel, &aligner);
        let candidate = Candidate::from_structure_id("3abc_A", format!("MAVM{}", reference(1)));

        let first = classifier.classify(&candidate).unwrap();
        let second = classifier.classify(&candidate).unwrap();
        assert_eq!(first, second);
    }
}
