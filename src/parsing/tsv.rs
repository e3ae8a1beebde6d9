use std::path::Path;

use crate::core::candidate::{Candidate, CandidateQuery};
use crate::parsing::ParseError;
use crate::utils::validation::{check_candidate_limit, normalize_sequence};

/// Check if the path is a chain table
pub fn is_tsv_file(path: &Path) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"))
}

/// Parse a chain table file with columns: `structure_id`, `pdb_code`, `sequence`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_tsv_file(path: &Path, query: &CandidateQuery) -> Result<Vec<Candidate>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_tsv_text(&content, query)
}

/// Parse chain table text with columns: `structure_id`, `pdb_code`, `sequence`
///
/// Blank lines and `#` comments are skipped, as is a header row whose first
/// field is `structure_id`.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 3 fields or
/// a sequence contains unexpected residue codes, or
/// `ParseError::TooManyCandidates` if the limit is exceeded.
pub fn parse_tsv_text(text: &str, query: &CandidateQuery) -> Result<Vec<Candidate>, ParseError> {
    let mut candidates = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

        if first_data_line {
            first_data_line = false;
            if fields[0].eq_ignore_ascii_case("structure_id") {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < 3 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 3 fields"
            )));
        }

        let sequence = normalize_sequence(fields[2]).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid sequence on line {line_num}"))
        })?;
        if !query.accepts(sequence.len()) {
            continue;
        }

        if check_candidate_limit(candidates.len()).is_some() {
            return Err(ParseError::TooManyCandidates(candidates.len()));
        }
        candidates.push(Candidate::new(fields[0], fields[1], sequence));
    }

    Ok(candidates)
}
