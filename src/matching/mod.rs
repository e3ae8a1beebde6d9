//! Sequence classification cascade.
//!
//! - [`SequenceClassifier`]: main entry point; classifies one candidate chain
//! - [`TierThresholds`]: score boundaries between tiers
//! - [`StructuralAligner`]: the structural fallback seam
//!
//! ## Cascade
//!
//! 1. **Start motif pre-filter**: candidates carrying none of the panel's
//!    conserved start motifs (allowing two missing N-terminal residues) are
//!    excluded without a tier
//! 2. **Normalization**: His-tag removal, then construct detection by length
//!    (truncated, single-chain construct, mature domain) with leader removal
//! 3. **Similarity**: best InDel similarity ratio across the panel; the
//!    first identical reference ends the search
//! 4. **Tiering**: `exact`, `excellent` or `good` directly from the score
//! 5. **Structural fallback**: low scores are settled as `possible` or
//!    `poor` using the candidate's coverage of the canonical alignment region
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdb_curator::catalog::ReferencePanel;
//! use pdb_curator::core::Candidate;
//! use pdb_curator::matching::{AlignmentConfig, AlignmentRecordStore, SequenceClassifier};
//! use std::path::Path;
//!
//! let panel = ReferencePanel::load(
//!     Path::new("search_sequences.json"),
//!     Path::new("class_i_starts.json"),
//!     "class_i",
//! )
//! .unwrap();
//! let aligner = AlignmentRecordStore::new("alignments", &AlignmentConfig::default());
//! let classifier = SequenceClassifier::new(&panel, &aligner);
//!
//! let candidate = Candidate::from_structure_id("1hhk_A", "GSHSMRYFFTSVSRPGRGEPRF");
//! if let Some(result) = classifier.classify(&candidate) {
//!     println!("{} {:.3} {:?}", result.tier, result.score, result.matched_to);
//! }
//! ```

pub mod alignment;
pub mod engine;
pub mod normalize;
pub mod scoring;
pub mod similarity;

pub use alignment::{AlignError, AlignmentConfig, AlignmentRecordStore, StructuralAligner};
pub use engine::{Classification, ClassifierConfig, SequenceClassifier, StructuralCheck};
pub use normalize::{LeaderStrip, NormalizationConfig, Normalized};
pub use scoring::{FuzzyDecision, TierThresholds};
