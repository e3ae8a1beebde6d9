//! Normalized sequence similarity.
//!
//! The similarity of two sequences is the InDel-normalized Levenshtein ratio
//! (substitutions cost two edits), which reduces to
//!
//! ```text
//! ratio = 2 * LCS(a, b) / (|a| + |b|)
//! ```
//!
//! The ratio is left unrounded, so a score of 1.0 means the sequences are
//! identical.
//!
//! LCS is computed with the bit-parallel algorithm of Hyyrö (2004), one
//! 64-bit word per 64 residues of the pattern, so a pattern is prepared once
//! per reference and reused against every candidate.

/// Number of distinct byte values a pattern can contain
const ALPHABET: usize = 256;

/// Convert a residue count to f64; sequence lengths are far below 2^52
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// A sequence prepared for repeated LCS queries
#[derive(Debug, Clone)]
pub struct BitPattern {
    len: usize,
    words: usize,
    /// `masks[byte * words + w]` has bit `i` set when `pattern[64 * w + i] == byte`
    masks: Vec<u64>,
}

impl BitPattern {
    pub fn new(pattern: &str) -> Self {
        let bytes = pattern.as_bytes();
        let words = bytes.len().div_ceil(64).max(1);
        let mut masks = vec![0u64; ALPHABET * words];
        for (i, &b) in bytes.iter().enumerate() {
            masks[usize::from(b) * words + i / 64] |= 1u64 << (i % 64);
        }
        Self {
            len: bytes.len(),
            words,
            masks,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the longest common subsequence of the pattern and `text`
    pub fn lcs_len(&self, text: &str) -> usize {
        let mut state = vec![u64::MAX; self.words];

        for &b in text.as_bytes() {
            let mask = &self.masks[usize::from(b) * self.words..][..self.words];
            let mut carry = false;
            for (v, &m) in state.iter_mut().zip(mask) {
                let u = *v & m;
                let (sum, c1) = v.overflowing_add(u);
                let (sum, c2) = sum.overflowing_add(u64::from(carry));
                carry = c1 || c2;
                *v = sum | (*v & !m);
            }
        }

        // Bits at or above `len` never clear, so counting zeros over every word is exact
        state.iter().map(|v| v.count_zeros() as usize).sum()
    }

    /// Similarity of the pattern and `text`, in [0, 1]
    pub fn ratio(&self, text: &str) -> f64 {
        if self.len == 0 || text.is_empty() {
            return 0.0;
        }
        count_to_f64(2 * self.lcs_len(text)) / count_to_f64(self.len + text.len())
    }
}

/// Similarity of two sequences, in [0, 1].
///
/// Returns 0.0 when either sequence is empty.
///
/// ```
/// use pdb_curator::matching::similarity::ratio;
///
/// assert_eq!(ratio("GSHSMRYF", "GSHSMRYF"), 1.0);
/// assert_eq!(ratio("GSHSMRYF", "GSHSMKYF"), 0.875);
/// assert_eq!(ratio("GSHSMRYF", ""), 0.0);
/// ```
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    BitPattern::new(a).ratio(b)
}
