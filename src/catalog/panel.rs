use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::utils::files::{read_json, FileError};
use crate::utils::text::slugify;
use crate::utils::validation::normalize_sequence;

/// Start motifs shorter than this would match almost anything once the
/// tolerated N-terminal residues are dropped
pub const MIN_MOTIF_LENGTH: usize = 3;

/// Residues a motif may be missing from its N-terminus and still count as present
pub const MOTIF_N_TERMINAL_TOLERANCE: usize = 2;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Molecule family '{0}' not found in reference panel")]
    UnknownFamily(String),

    #[error("Reference panel for '{family}' is malformed: {reason}")]
    Malformed { family: String, reason: String },

    #[error("Reference panel for '{family}' has {labels} labels but {sequences} sequences")]
    LengthMismatch {
        family: String,
        labels: usize,
        sequences: usize,
    },

    #[error("Reference '{label}' has an invalid sequence")]
    InvalidSequence { label: String },

    #[error("Reference panel for '{0}' is empty")]
    EmptyPanel(String),

    #[error("Start motif list is empty")]
    EmptyMotifs,

    #[error("Start motif '{0}' is invalid (must be at least {MIN_MOTIF_LENGTH} residue codes)")]
    InvalidMotif(String),
}

/// One labelled reference sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Human-readable allele or family name, e.g. `HLA-A*02:01`
    pub label: String,

    /// Slugified label, as written to `matched_to`
    pub slug: String,

    /// Canonical sequence
    pub sequence: String,
}

impl ReferenceEntry {
    pub fn new(label: impl Into<String>, sequence: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            slug: slugify(&label),
            label,
            sequence: sequence.into(),
        }
    }
}

/// A start motif found in a candidate sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifHit<'a> {
    /// The motif as declared in the motif file
    pub motif: &'a str,

    /// How many leading motif residues were missing from the candidate
    pub trimmed: usize,
}

impl MotifHit<'_> {
    /// The part of the motif actually present in the candidate
    pub fn matched(&self) -> &str {
        &self.motif[self.trimmed..]
    }
}

/// A family's panel as it appears in the panel file
#[derive(Deserialize)]
#[serde(untagged)]
enum FamilyPanel {
    Parallel {
        labels: Vec<String>,
        sequences: Vec<String>,
    },
    Mapping(Map<String, Value>),
}

/// Ordered reference sequences for one molecule family, plus its start motifs.
///
/// Order is significant: when several references reach the same best score
/// the first one declared wins.
#[derive(Debug, Clone)]
pub struct ReferencePanel {
    family: String,
    entries: Vec<ReferenceEntry>,
    start_motifs: Vec<String>,
}

impl ReferencePanel {
    /// Build a panel from entries already in memory
    ///
    /// # Errors
    ///
    /// Returns `PanelError::EmptyPanel`, `PanelError::EmptyMotifs` or
    /// `PanelError::InvalidMotif` if the inputs cannot drive classification.
    pub fn new(
        family: impl Into<String>,
        entries: Vec<ReferenceEntry>,
        start_motifs: Vec<String>,
    ) -> Result<Self, PanelError> {
        let family = family.into();
        if entries.is_empty() {
            return Err(PanelError::EmptyPanel(family));
        }
        if start_motifs.is_empty() {
            return Err(PanelError::EmptyMotifs);
        }

        let start_motifs = start_motifs
            .into_iter()
            .map(|motif| match normalize_sequence(&motif) {
                Some(normalized) if normalized.len() >= MIN_MOTIF_LENGTH => Ok(normalized),
                _ => Err(PanelError::InvalidMotif(motif)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            family,
            entries,
            start_motifs,
        })
    }

    /// Load the panel for `family` from a panel file and a start motif file
    ///
    /// # Errors
    ///
    /// Returns a `PanelError` if either file is missing or malformed, or if
    /// the family is absent or empty.
    pub fn load(panel_path: &Path, motifs_path: &Path, family: &str) -> Result<Self, PanelError> {
        let panels: Map<String, Value> = read_json(panel_path)?;
        let motifs: Vec<String> = read_json(motifs_path)?;
        let panel = Self::from_panel_map(panels, motifs, family)?;
        debug!(
            family,
            references = panel.len(),
            motifs = panel.start_motifs.len(),
            "Loaded reference panel"
        );
        Ok(panel)
    }

    /// Parse from an already-deserialized panel document
    ///
    /// # Errors
    ///
    /// See [`ReferencePanel::load`].
    pub fn from_panel_map(
        mut panels: Map<String, Value>,
        motifs: Vec<String>,
        family: &str,
    ) -> Result<Self, PanelError> {
        let raw = panels
            .remove(family)
            .ok_or_else(|| PanelError::UnknownFamily(family.to_string()))?;

        let parsed: FamilyPanel =
            serde_json::from_value(raw).map_err(|e| PanelError::Malformed {
                family: family.to_string(),
                reason: e.to_string(),
            })?;

        let pairs: Vec<(String, String)> = match parsed {
            FamilyPanel::Parallel { labels, sequences } => {
                if labels.len() != sequences.len() {
                    return Err(PanelError::LengthMismatch {
                        family: family.to_string(),
                        labels: labels.len(),
                        sequences: sequences.len(),
                    });
                }
                labels.into_iter().zip(sequences).collect()
            }
            FamilyPanel::Mapping(map) => map
                .into_iter()
                .map(|(label, value)| match value {
                    Value::String(sequence) => Ok((label, sequence)),
                    _ => Err(PanelError::InvalidSequence { label }),
                })
                .collect::<Result<_, _>>()?,
        };

        let entries = pairs
            .into_iter()
            .map(|(label, sequence)| match normalize_sequence(&sequence) {
                Some(sequence) if !sequence.is_empty() => Ok(ReferenceEntry::new(label, sequence)),
                _ => Err(PanelError::InvalidSequence { label }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(family, entries, motifs)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn start_motifs(&self) -> &[String] {
        &self.start_motifs
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first start motif present in `sequence`, tolerating up to
    /// [`MOTIF_N_TERMINAL_TOLERANCE`] missing N-terminal motif residues.
    ///
    /// For each motif in declaration order the full motif is tried first,
    /// then the motif minus one leading residue, then minus two.
    pub fn find_start_motif(&self, sequence: &str) -> Option<MotifHit<'_>> {
        self.start_motifs.iter().find_map(|motif| {
            (0..=MOTIF_N_TERMINAL_TOLERANCE)
                .find(|&trimmed| sequence.contains(&motif[trimmed..]))
                .map(|trimmed| MotifHit {
                    motif: motif.as_str(),
                    trimmed,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn motifs() -> Vec<String> {
        vec!["GSHSMRYF".to_string(), "CSHSMKYF".to_string()]
    }

    #[test]
    fn test_mapping_form_preserves_declaration_order() {
        let doc = json!({
            "class_i": {
                "HLA-B*27:05": "GSHSMRYFHTSVSRPGRGEPRFITVGYVDDTLFVRFDSDAASPREEPRAPWIEQEGPEYWDRETQICKAKAQTDREDLRTLLRYYNQSEA",
                "HLA-A*02:01": "GSHSMRYFFTSVSRPGRGEPRFIAVGYVDDTQFVRFDSDAASQRMEPRAPWIEQEGPEYWDGETRKVKAHSQTHRVDLGTLRGYYNQSEA"
            }
        });
        let map = doc.as_object().unwrap().clone();
        let panel = ReferencePanel::from_panel_map(map, motifs(), "class_i").unwrap();

        let labels: Vec<&str> = panel.labels().collect();
        assert_eq!(labels, vec!["HLA-B*27:05", "HLA-A*02:01"]);
        assert_eq!(panel.entries()[1].slug, "hla_a_02_01");
    }

    #[test]
    fn test_parallel_list_form() {
        let doc = json!({
            "class_i": {
                "labels": ["HLA-A*02:01", "HLA-A*11:01"],
                "sequences": ["GSHSMRYFFTSVSRPG", "GSHSMRYFYTSVSRPG"]
            }
        });
        let map = doc.as_object().unwrap().clone();
        let panel = ReferencePanel::from_panel_map(map, motifs(), "class_i").unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.entries()[1].label, "HLA-A*11:01");
    }

    #[test]
    fn test_parallel_list_length_mismatch() {
        let doc = json!({
            "class_i": { "labels": ["a", "b"], "sequences": ["GSHS"] }
        });
        let map = doc.as_object().unwrap().clone();
        assert!(matches!(
            ReferencePanel::from_panel_map(map, motifs(), "class_i"),
            Err(PanelError::LengthMismatch { labels: 2, sequences: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_family_and_bad_sequence() {
        let doc = json!({ "class_i": { "bad": "GSHS-123" } });
        let map = doc.as_object().unwrap().clone();
        assert!(matches!(
            ReferencePanel::from_panel_map(map.clone(), motifs(), "class_ii"),
            Err(PanelError::UnknownFamily(_))
        ));
        assert!(matches!(
            ReferencePanel::from_panel_map(map, motifs(), "class_i"),
            Err(PanelError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn test_empty_inputs_are_fatal() {
        let entries = vec![ReferenceEntry::new("a", "GSHSMRYF")];
        assert!(matches!(
            ReferencePanel::new("class_i", Vec::new(), motifs()),
            Err(PanelError::EmptyPanel(_))
        ));
        assert!(matches!(
            ReferencePanel::new("class_i", entries.clone(), Vec::new()),
            Err(PanelError::EmptyMotifs)
        ));
        assert!(matches!(
            ReferencePanel::new("class_i", entries, vec!["GS".to_string()]),
            Err(PanelError::InvalidMotif(_))
        ));
    }

    #[test]
    fn test_find_start_motif_tolerates_missing_n_terminus() {
        let panel = ReferencePanel::new(
            "class_i",
            vec![ReferenceEntry::new("a", "GSHSMRYF")],
            motifs(),
        )
        .unwrap();

        let full = panel.find_start_motif("MAVMAPRTGSHSMRYFYTSV").unwrap();
        assert_eq!(full.motif, "GSHSMRYF");
        assert_eq!(full.trimmed, 0);

        let minus_one = panel.find_start_motif("SHSMRYFYTSV").unwrap();
        assert_eq!(minus_one.trimmed, 1);
        assert_eq!(minus_one.matched(), "SHSMRYF");

        let minus_two = panel.find_start_motif("HSMKYFYTSV").unwrap();
        assert_eq!(minus_two.motif, "CSHSMKYF");
        assert_eq!(minus_two.trimmed, 2);

        assert!(panel.find_start_motif("SMRYFYTSV").is_none());
    }

    #[test]
    fn test_load_from_files() {
        let mut panel_file = NamedTempFile::with_suffix(".json").unwrap();
        panel_file
            .write_all(br#"{"class_i": {"HLA-A*02:01": "gshsmryfftsv"}}"#)
            .unwrap();
        let mut motif_file = NamedTempFile::with_suffix(".json").unwrap();
        motif_file.write_all(br#"["GSHSMRYF"]"#).unwrap();

        let panel = ReferencePanel::load(panel_file.path(), motif_file.path(), "class_i").unwrap();
        assert_eq!(panel.family(), "class_i");
        assert_eq!(panel.entries()[0].sequence, "GSHSMRYFFTSV");
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let motif_file = NamedTempFile::with_suffix(".json").unwrap();
        let result = ReferencePanel::load(
            Path::new("/nonexistent/panel.json"),
            motif_file.path(),
            "class_i",
        );
        assert!(matches!(result, Err(PanelError::File(FileError::Read { .. }))));
    }
}
