//! # pdb-curator
//!
//! A library for finding the members of a molecule family in the Protein
//! Data Bank and curating per-structure records for them.
//!
//! Every chain in the PDB is a candidate. Each candidate is compared against
//! a small panel of labelled reference sequences (for example the classical
//! MHC class I alleles) and sorted into a confidence tier. Accepted chains
//! become work for a set of idempotent curation steps, each of which writes
//! one JSON facet per structure.
//!
//! ## Features
//!
//! - **Motif pre-filter**: chains without a family start motif near the
//!   N-terminus never reach the expensive comparison
//! - **Construct-aware normalization**: purification tags, leader peptides,
//!   truncated and single-chain constructs are handled before comparison
//! - **Structural fallback**: inconclusive chains are settled by superposition coverage
//! - **Resumable scans**: checkpoints let a sweep over the whole PDB restart
//!   where it stopped
//! - **Idempotent steps**: facets are only computed once unless forced, with
//!   manual overrides merged over every payload
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pdb_curator::{AlignmentConfig, AlignmentRecordStore, Candidate, ReferencePanel, SequenceClassifier};
//!
//! let panel = ReferencePanel::load(Path::new("panel.json"), Path::new("motifs.json"), "class_i").unwrap();
//! let aligner = AlignmentRecordStore::new("alignments", &AlignmentConfig::default());
//! let classifier = SequenceClassifier::new(&panel, &aligner);
//!
//! let candidate = Candidate::from_structure_id("1hhk_A", "GSHSMRYFFTSVSRPGRGEPRFIAVGYVDDTQFVRFDSDAASQRMEPRAPWIEQEGPEYWDGETRKVKAHSQTHRVDLGTLRGYYNQSEA");
//! if let Some(result) = classifier.classify(&candidate) {
//!     println!("{}: {} ({:.3})", candidate.structure_id, result.tier, result.score);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Reference panel, start motifs, scan lists and overrides
//! - [`core`]: Candidates, tiers and match results
//! - [`matching`]: Normalization, similarity and the classifier
//! - [`scan`]: Checkpointed sweep over the candidate set
//! - [`pipeline`]: Facet store, work executor and curation steps
//! - [`parsing`]: Candidate sources (seqres FASTA, chain tables)
//! - [`config`]: Configuration file
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod pipeline;
pub mod scan;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::panel::ReferencePanel;
pub use config::PipelineConfig;
pub use core::candidate::{Candidate, CandidateQuery};
pub use core::types::*;
pub use matching::{AlignmentConfig, AlignmentRecordStore, Classification, SequenceClassifier};
pub use scan::{ScanController, ScanReport};
