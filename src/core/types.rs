use serde::{Deserialize, Serialize};

/// Confidence tier assigned to a classified chain, in descending confidence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Exact,
    Excellent,
    Good,
    Possible,
    Poor,
}

impl Tier {
    /// All tiers, most confident first
    pub const ALL: [Tier; 5] = [
        Tier::Exact,
        Tier::Excellent,
        Tier::Good,
        Tier::Possible,
        Tier::Poor,
    ];

    /// Position of this tier in [`Tier::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Exact => 0,
            Self::Excellent => 1,
            Self::Good => 2,
            Self::Possible => 3,
            Self::Poor => 4,
        }
    }

    /// Lowercase name, used for file stems (`exact.json`, `tmp_poor.json`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Possible => "possible",
            Self::Poor => "poor",
        }
    }

    /// Tiers whose members are treated as members of the family by later steps
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Exact | Self::Excellent | Self::Good)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

/// How a candidate sequence was interpreted before comparison, based on its length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructType {
    /// Short construct; compared against clipped reference sequences
    Truncated,
    /// Fused multi-domain chain; leading domain is stripped before comparison
    SingleChainConstruct,
    /// Mature extracellular domain, possibly still carrying a leader peptide
    Cytoplasmic,
}

impl std::fmt::Display for ConstructType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated"),
            Self::SingleChainConstruct => write!(f, "single_chain_construct"),
            Self::Cytoplasmic => write!(f, "cytoplasmic"),
        }
    }
}

/// Outcome of classifying one chain, as stored in a tier collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub pdb_code: String,

    /// Chain the score was computed for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,

    /// Similarity to the best reference, in [0, 1]
    pub score: f64,

    /// Slugified label of the best reference, if any reference scored above zero
    pub matched_to: Option<String>,
}

impl MatchResult {
    pub fn new(pdb_code: impl Into<String>, score: f64, matched_to: Option<String>) -> Self {
        Self {
            pdb_code: pdb_code.into(),
            structure_id: None,
            score,
            matched_to,
        }
    }

    #[must_use]
    pub fn with_structure_id(mut self, structure_id: impl Into<String>) -> Self {
        self.structure_id = Some(structure_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_is_descending_confidence() {
        let mut shuffled = vec![Tier::Poor, Tier::Good, Tier::Exact, Tier::Possible, Tier::Excellent];
        shuffled.sort();
        assert_eq!(shuffled, Tier::ALL.to_vec());
    }

    #[test]
    fn test_tier_index_matches_all() {
        for (i, tier) in Tier::ALL.into_iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn test_tier_round_trips_through_str() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("great".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_serializes_snake_case() {
        let json = serde_json::to_string(&Tier::Excellent).unwrap();
        assert_eq!(json, "\"excellent\"");
        let json = serde_json::to_string(&ConstructType::SingleChainConstruct).unwrap();
        assert_eq!(json, "\"single_chain_construct\"");
    }

    #[test]
    fn test_accepted_tiers() {
        assert!(Tier::Exact.is_accepted());
        assert!(Tier::Good.is_accepted());
        assert!(!Tier::Possible.is_accepted());
        assert!(!Tier::Poor.is_accepted());
    }
}
