use serde::{Deserialize, Serialize};

/// One chain record from the structural database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Per-chain key, e.g. `1hhk_A`
    pub structure_id: String,

    /// Lowercased structure identifier shared by every chain of the entry
    pub pdb_code: String,

    /// One-letter residue sequence
    pub sequence: String,
}

impl Candidate {
    pub fn new(
        structure_id: impl Into<String>,
        pdb_code: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Self {
        Self {
            structure_id: structure_id.into(),
            pdb_code: pdb_code.into().to_lowercase(),
            sequence: sequence.into(),
        }
    }

    /// Build a candidate from a `pdb_chain` style identifier (`1HHK_A`)
    pub fn from_structure_id(structure_id: impl Into<String>, sequence: impl Into<String>) -> Self {
        let structure_id = structure_id.into();
        let pdb_code = structure_id
            .split('_')
            .next()
            .unwrap_or(structure_id.as_str())
            .to_string();
        Self::new(structure_id, pdb_code, sequence)
    }

    /// Chain label after the underscore, if any (`A` for `1hhk_A`)
    pub fn chain_label(&self) -> Option<&str> {
        self.structure_id.split_once('_').map(|(_, chain)| chain)
    }

    /// Key identifying a (structure, sequence) pair; homomeric chains share it
    pub fn unique_key(&self) -> String {
        format!("{}{}", self.pdb_code, self.sequence)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Length range applied when pulling candidates from the database.
///
/// Both bounds are exclusive, so the default keeps chains of 161..=499 residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for CandidateQuery {
    fn default() -> Self {
        Self {
            min_length: 160,
            max_length: 500,
        }
    }
}

impl CandidateQuery {
    /// A query that keeps every chain
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            min_length: 0,
            max_length: usize::MAX,
        }
    }

    #[must_use]
    pub fn accepts(&self, length: usize) -> bool {
        self.min_length < length && length < self.max_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_structure_id_lowercases_pdb_code() {
        let candidate = Candidate::from_structure_id("1HHK_A", "GSHSMRYF");
        assert_eq!(candidate.pdb_code, "1hhk");
        assert_eq!(candidate.structure_id, "1HHK_A");
        assert_eq!(candidate.chain_label(), Some("A"));
    }

    #[test]
    fn test_unique_key_combines_code_and_sequence() {
        let a = Candidate::from_structure_id("1hhk_A", "GSHS");
        let b = Candidate::from_structure_id("1hhk_D", "GSHS");
        let c = Candidate::from_structure_id("1hhk_B", "IQRT");
        assert_eq!(a.unique_key(), b.unique_key());
        assert_ne!(a.unique_key(), c.unique_key());
    }

    #[test]
    fn test_query_bounds_are_exclusive() {
        let query = CandidateQuery::default();
        assert!(!query.accepts(160));
        assert!(query.accepts(161));
        assert!(query.accepts(499));
        assert!(!query.accepts(500));
        assert!(CandidateQuery::unbounded().accepts(1));
    }
}
