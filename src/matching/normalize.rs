//! Length-based normalization of candidate sequences.
//!
//! Deposited chains are frequently engineered constructs rather than the
//! mature domain a reference panel describes. Before comparison a candidate
//! is stripped of poly-histidine purification tags and interpreted by length:
//!
//! | Length (after tag removal) | Interpretation            | Action                                   |
//! |----------------------------|---------------------------|------------------------------------------|
//! | `< truncated_below`        | truncated construct       | compare against clipped references       |
//! | `> single_chain_above`     | single-chain construct    | strip the leading domain at the motif    |
//! | otherwise                  | mature (cytoplasmic) chain| strip a leader peptide when long, clip   |

use serde::{Deserialize, Serialize};

use crate::catalog::panel::ReferencePanel;
use crate::core::types::ConstructType;

/// Length cut-offs used to interpret a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Purification tag removed wherever it occurs
    pub his_tag: String,
    /// Sequences shorter than this are truncated constructs
    pub truncated_below: usize,
    /// Truncated constructs are compared against this many leading reference residues
    pub truncated_reference_length: usize,
    /// Sequences longer than this are single-chain constructs
    pub single_chain_above: usize,
    /// Mature chains longer than this may still carry a leader peptide
    pub leader_strip_above: usize,
    /// Mature chains are clipped to this length after leader removal
    pub mature_length: usize,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            his_tag: "HHHHHH".to_string(),
            truncated_below: 200,
            truncated_reference_length: 180,
            single_chain_above: 370,
            leader_strip_above: 280,
            mature_length: 275,
        }
    }
}

/// What happened when trying to remove a leading peptide or domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderStrip {
    NotAttempted,
    Stripped,
    /// No start motif with a non-empty remainder; the sequence was left as is
    Failed,
}

/// A candidate sequence ready for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub sequence: String,
    pub construct: ConstructType,
    pub leader: LeaderStrip,
}

impl Normalized {
    pub fn leader_strip_failed(&self) -> bool {
        self.leader == LeaderStrip::Failed
    }
}

/// Remove every occurrence of the purification tag
#[must_use]
pub fn strip_his_tags(sequence: &str, tag: &str) -> String {
    if tag.is_empty() {
        return sequence.to_string();
    }
    sequence.replace(tag, "")
}

/// Cut everything before the first start motif found in `sequence`.
///
/// The returned sequence begins with the full declared motif, restoring any
/// N-terminal motif residues that were missing from the candidate. Returns
/// None if no motif is present or nothing follows it.
#[must_use]
pub fn remove_leader_sequence(sequence: &str, panel: &ReferencePanel) -> Option<String> {
    let hit = panel.find_start_motif(sequence)?;
    let matched = hit.matched();
    let start = sequence.find(matched)?;
    let remainder = &sequence[start + matched.len()..];
    if remainder.is_empty() {
        None
    } else {
        Some(format!("{}{remainder}", hit.motif))
    }
}

/// Normalize a candidate for comparison against `panel`
#[must_use]
pub fn normalize(sequence: &str, panel: &ReferencePanel, config: &NormalizationConfig) -> Normalized {
    let untagged = strip_his_tags(sequence, &config.his_tag);
    let length = untagged.len();

    if length < config.truncated_below {
        return Normalized {
            sequence: untagged,
            construct: ConstructType::Truncated,
            leader: LeaderStrip::NotAttempted,
        };
    }

    if length > config.single_chain_above {
        return match remove_leader_sequence(&untagged, panel) {
            Some(split) => Normalized {
                sequence: split,
                construct: ConstructType::SingleChainConstruct,
                leader: LeaderStrip::Stripped,
            },
            None => Normalized {
                sequence: untagged,
                construct: ConstructType::SingleChainConstruct,
                leader: LeaderStrip::Failed,
            },
        };
    }

    if length <= config.leader_strip_above {
        return Normalized {
            sequence: untagged,
            construct: ConstructType::Cytoplasmic,
            leader: LeaderStrip::NotAttempted,
        };
    }

    match remove_leader_sequence(&untagged, panel) {
        Some(mut split) => {
            if let Some((end, _)) = split.char_indices().nth(config.mature_length) {
                split.truncate(end);
            }
            Normalized {
                sequence: split,
                construct: ConstructType::Cytoplasmic,
                leader: LeaderStrip::Stripped,
            }
        }
        None => Normalized {
            sequence: untagged,
            construct: ConstructType::Cytoplasmic,
            leader: LeaderStrip::Failed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::panel::ReferenceEntry;

    const MOTIF: &str = "GSHSMRYF";

    fn panel() -> ReferencePanel {
        ReferencePanel::new(
            "class_i",
            vec![ReferenceEntry::new("HLA-A*02:01", format!("{MOTIF}FTSV"))],
            vec![MOTIF.to_string()],
        )
        .unwrap()
    }

    fn filler(len: usize) -> String {
        "ACDEFGIKLMNPQRSTVWY".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_strip_his_tags() {
        assert_eq!(strip_his_tags("GSHSMRYFHHHHHH", "HHHHHH"), "GSHSMRYF");
        assert_eq!(strip_his_tags("HHHHHHGSHSHHHHHH", "HHHHHH"), "GSHS");
        assert_eq!(strip_his_tags("GSHHHHH", "HHHHHH"), "GSHHHHH");
        assert_eq!(strip_his_tags("GSHS", ""), "GSHS");
    }

    #[test]
    fn test_remove_leader_restores_full_motif() {
        let panel = panel();
        assert_eq!(
            remove_leader_sequence("MAVMAPRTLLLSHSMRYFYTSV", &panel).as_deref(),
            Some("GSHSMRYFYTSV")
        );
        assert!(remove_leader_sequence("MAVMAPRTLLL", &panel).is_none());
        assert!(remove_leader_sequence("MAVGSHSMRYF", &panel).is_none());
    }

    #[test]
    fn test_truncated_construct() {
        let seq = format!("{MOTIF}{}", filler(142));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::Truncated);
        assert_eq!(normalized.sequence, seq);
        assert_eq!(normalized.leader, LeaderStrip::NotAttempted);
    }

    #[test]
    fn test_his_tag_removed_before_length_check() {
        // 196 residues + 6 tag residues would be 202 if the tag were counted
        let seq = format!("{MOTIF}{}HHHHHH", filler(188));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::Truncated);
        assert_eq!(normalized.sequence.len(), 196);
    }

    #[test]
    fn test_mature_chain_left_alone() {
        let seq = format!("{MOTIF}{}", filler(267));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::Cytoplasmic);
        assert_eq!(normalized.sequence, seq);
        assert!(!normalized.leader_strip_failed());
    }

    #[test]
    fn test_long_mature_chain_loses_leader_and_is_clipped() {
        let leader = "MAVMAPRTLVLLLSGALALTQTWA";
        let seq = format!("{leader}{MOTIF}{}", filler(290));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::Cytoplasmic);
        assert_eq!(normalized.leader, LeaderStrip::Stripped);
        assert!(normalized.sequence.starts_with(MOTIF));
        assert_eq!(normalized.sequence.len(), 275);
    }

    #[test]
    fn test_clip_counts_characters_not_bytes() {
        // The two-byte residue straddles byte 275
        let seq = format!("MAVM{MOTIF}{}\u{e9}{}", filler(266), filler(10));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.leader, LeaderStrip::Stripped);
        assert_eq!(normalized.sequence.chars().count(), 275);
        assert!(normalized.sequence.ends_with('\u{e9}'));
    }

    #[test]
    fn test_leader_strip_failure_keeps_sequence() {
        let seq = filler(300);
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::Cytoplasmic);
        assert!(normalized.leader_strip_failed());
        assert_eq!(normalized.sequence, seq);
    }

    #[test]
    fn test_single_chain_construct_strips_leading_domain() {
        // peptide-linker-b2m-linker-heavy chain style fusion
        let leading = filler(120);
        let seq = format!("{leading}{MOTIF}{}", filler(270));
        let normalized = normalize(&seq, &panel(), &NormalizationConfig::default());
        assert_eq!(normalized.construct, ConstructType::SingleChainConstruct);
        assert_eq!(normalized.leader, LeaderStrip::Stripped);
        assert_eq!(normalized.sequence.len(), 278);
        assert!(normalized.sequence.starts_with(MOTIF));
    }
}
