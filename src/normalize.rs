//! Name normalization shared by the matcher and the diagnostics output.
//!
//! Every comparison goes through [`normalize_name`] on both sides. Changing it
//! changes which names match exactly, so keep the tests below in sync.

use any_ascii::any_ascii;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing combining marks.
/// e.g., "Société Générale" → "societe generale"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Then transliterate any remaining non-ASCII (Cyrillic, CJK, etc.)
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a name for comparison: trim surrounding whitespace and lowercase.
///
/// With `fold_diacritics`, accents and non-Latin scripts are folded to ASCII
/// first. Internal whitespace is left as-is.
pub fn normalize_name(name: &str, fold_diacritics: bool) -> String {
    let trimmed = name.trim();
    if fold_diacritics {
        fold_to_ascii(trimmed).trim().to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Split a normalized name into tokens usable for keyword overlap.
/// Tokens shorter than `min_len` characters are dropped.
pub fn keyword_tokens(normalized: &str, min_len: usize) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() >= min_len)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
