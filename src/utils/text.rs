//! Text helpers shared by the classifier and the pipeline steps.

/// Turn a reference label into a lowercase, underscore-separated slug.
///
/// Runs of non-alphanumeric characters collapse to a single underscore and
/// leading/trailing separators are dropped.
///
/// ```
/// use pdb_curator::utils::text::slugify;
///
/// assert_eq!(slugify("HLA-A*02:01"), "hla_a_02_01");
/// assert_eq!(slugify("H2-Kb"), "h2_kb");
/// ```
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_separator = false;

    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Uppercase the first character and lowercase the rest
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("HLA-B*27:05"), "hla_b_27_05");
        assert_eq!(slugify("  Mamu-A1*001:01  "), "mamu_a1_001_01");
        assert_eq!(slugify("H-2Db"), "h_2db");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(
            capitalize("CRYSTAL STRUCTURE OF HLA-A2"),
            "Crystal structure of hla-a2"
        );
        assert_eq!(capitalize(""), "");
    }
}
