//! Candidate sources.
//!
//! - **PDB seqres FASTA** (`pdb_seqres.txt`, optionally gzipped): protein
//!   chains, keyed by `pdb_chain` record names
//! - **Chain tables** (`.tsv`): `structure_id`, `pdb_code`, `sequence`
//!
//! Both apply a [`CandidateQuery`] length range while reading, so chains
//! outside the range never reach the classifier.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdb_curator::core::candidate::CandidateQuery;
//! use pdb_curator::parsing::parse_candidates;
//! use std::path::Path;
//!
//! let candidates = parse_candidates(Path::new("pdb_seqres.txt.gz"), &CandidateQuery::default()).unwrap();
//! println!("{} chains", candidates.len());
//! ```

pub mod fasta;
pub mod tsv;

use std::path::Path;

use thiserror::Error;

use crate::core::candidate::{Candidate, CandidateQuery};
use crate::utils::validation::MAX_CANDIDATES;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid candidate format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many candidates: {0} exceeds maximum allowed ({MAX_CANDIDATES})")]
    TooManyCandidates(usize),
}

/// Read candidates from a chain table or seqres FASTA, chosen by extension
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` for unknown extensions, or any
/// error from the underlying reader.
pub fn parse_candidates(path: &Path, query: &CandidateQuery) -> Result<Vec<Candidate>, ParseError> {
    if tsv::is_tsv_file(path) {
        tsv::parse_tsv_file(path, query)
    } else if fasta::is_fasta_file(path) {
        fasta::parse_fasta_file(path, query)
    } else {
        Err(ParseError::UnsupportedFormat(path.display().to_string()))
    }
}
