//! Reader for PDB `seqres` style FASTA using noodles.
//!
//! Records look like `>1hhk_A mol:protein length:275  HLA CLASS I ...`.
//! Only `mol:protein` records are kept. Plain and gzip/bgzip compressed
//! files are supported.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::debug;

use crate::core::candidate::{Candidate, CandidateQuery};
use crate::parsing::ParseError;
use crate::utils::validation::{check_candidate_limit, normalize_sequence};

const PROTEIN_TAG: &str = "mol:protein";

/// Check if the path has a FASTA or seqres extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    let stem = path_str
        .strip_suffix(".gz")
        .or_else(|| path_str.strip_suffix(".bgz"))
        .unwrap_or(&path_str);
    matches!(
        Path::new(stem)
            .extension()
            .and_then(OsStr::to_str),
        Some("fa" | "fasta" | "faa" | "txt")
    )
}

#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read protein chains whose length the query accepts.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles`
/// if a record is malformed, or `ParseError::TooManyCandidates` if the limit
/// is exceeded.
pub fn parse_fasta_file(path: &Path, query: &CandidateQuery) -> Result<Vec<Candidate>, ParseError> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(MultiGzDecoder::new(file)));
        parse_fasta_reader(&mut reader, query)
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        parse_fasta_reader(&mut reader, query)
    }
}

/// Parse FASTA text already in memory
///
/// # Errors
///
/// Same as [`parse_fasta_file`].
pub fn parse_fasta_text(text: &str, query: &CandidateQuery) -> Result<Vec<Candidate>, ParseError> {
    let mut reader = fasta::io::Reader::new(text.as_bytes());
    parse_fasta_reader(&mut reader, query)
}

fn parse_fasta_reader<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
    query: &CandidateQuery,
) -> Result<Vec<Candidate>, ParseError> {
    let mut candidates = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let is_protein = record
            .description()
            .map(|d| String::from_utf8_lossy(d).contains(PROTEIN_TAG))
            .unwrap_or(false);
        if !is_protein {
            continue;
        }

        let raw = String::from_utf8_lossy(record.sequence().as_ref()).to_string();
        let Some(sequence) = normalize_sequence(&raw) else {
            debug!(%name, "Skipping record with unexpected residue codes");
            continue;
        };
        if !query.accepts(sequence.len()) {
            continue;
        }

        if check_candidate_limit(candidates.len()).is_some() {
            return Err(ParseError::TooManyCandidates(candidates.len()));
        }
        candidates.push(Candidate::from_structure_id(name, sequence));
    }

    Ok(candidates)
}
