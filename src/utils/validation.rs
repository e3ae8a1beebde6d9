//! Centralized validation and helper functions.

/// Maximum number of candidates read from a single source (DOS protection)
pub const MAX_CANDIDATES: usize = 5_000_000;

/// Entity identifiers become file stems, so they share the filename limit
pub const MAX_ENTITY_ID_LENGTH: usize = 255;

/// One-letter codes accepted in a residue sequence (20 standard residues plus
/// the ambiguity and non-standard codes that appear in PDB seqres records)
const RESIDUE_CODES: &str = "ACDEFGHIKLMNPQRSTVWYBJOUXZ";

/// Check if adding another candidate would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new candidate.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_candidate_limit(count: usize) -> Option<String> {
    if count >= MAX_CANDIDATES {
        Some(format!(
            "Too many candidates: adding another would exceed maximum of {MAX_CANDIDATES}"
        ))
    } else {
        None
    }
}

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Entity id too long: exceeds {MAX_ENTITY_ID_LENGTH} characters")]
    EntityIdTooLong,
    #[error("Invalid entity id '{0}': contains path traversal or invalid characters")]
    InvalidEntityId(String),
    #[error("Empty entity id provided")]
    EmptyEntityId,
}

/// Validate an entity id before it is used as a facet file stem.
///
/// Rejects ids that are empty, too long, contain path separators or `..`,
/// contain control characters, or start with a dot.
///
/// # Errors
///
/// Returns `ValidationError::EmptyEntityId` if the id is empty,
/// `ValidationError::EntityIdTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidEntityId` if it contains invalid characters.
///
/// # Examples
///
/// ```
/// use pdb_curator::utils::validation::validate_entity_id;
///
/// assert!(validate_entity_id("1hhk").is_ok());
/// assert!(validate_entity_id("../etc/passwd").is_err());
/// ```
pub fn validate_entity_id(entity_id: &str) -> Result<&str, ValidationError> {
    if entity_id.trim().is_empty() {
        return Err(ValidationError::EmptyEntityId);
    }

    if entity_id.len() > MAX_ENTITY_ID_LENGTH {
        return Err(ValidationError::EntityIdTooLong);
    }

    let invalid = entity_id.contains("..")
        || entity_id.starts_with('.')
        || entity_id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));

    if invalid {
        return Err(ValidationError::InvalidEntityId(entity_id.to_string()));
    }

    Ok(entity_id)
}

/// Normalize a raw sequence to uppercase one-letter codes.
///
/// Whitespace is dropped. Returns None if any other character is not a residue code.
#[must_use]
pub fn normalize_sequence(raw: &str) -> Option<String> {
    let mut sequence = String::with_capacity(raw.len());
    for c in raw.chars().filter(|c| !c.is_whitespace()) {
        let upper = c.to_ascii_uppercase();
        if !RESIDUE_CODES.contains(upper) {
            return None;
        }
        sequence.push(upper);
    }
    Some(sequence)
}
