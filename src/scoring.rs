//! Scoring functions for legacy name matching.
//!
//! This module contains:
//! - Acceptance thresholds for each automatic strategy
//! - Normalized Levenshtein similarity
//! - Keyword overlap scoring

// ============================================================================
// Score Thresholds
// ============================================================================

/// Minimum edit-distance similarity to accept a fuzzy match
pub const FUZZY_THRESHOLD: f64 = 0.7;

/// Minimum share of legacy keywords that must appear in a candidate field
pub const KEYWORD_THRESHOLD: f64 = 0.5;

/// Tokens shorter than this are too noisy to discriminate between clients
pub const MIN_KEYWORD_TOKEN_LEN: usize = 4;

/// A keyword match also needs this many matching tokens in absolute terms
pub const MIN_KEYWORD_MATCHES: usize = 2;

// ============================================================================
// Edit Distance
// ============================================================================

/// Similarity between two already-normalized names (0.0 to 1.0).
///
/// `1 - levenshtein(a, b) / max(len(a), len(b))`, measured in characters.
/// Two empty strings score 0.0: nothing was compared, so nothing matched.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    let dist = strsim::levenshtein(a, b);
    1.0 - (dist as f64 / max_len as f64)
}

// ============================================================================
// Keyword Overlap
// ============================================================================

/// Keyword overlap between legacy tokens and one candidate field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordOverlap {
    pub matched: usize,
    pub total: usize,
}

impl KeywordOverlap {
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Count how many `tokens` occur as substrings of `field`.
/// Both sides are expected to be normalized already.
pub fn keyword_overlap(tokens: &[&str], field: &str) -> KeywordOverlap {
    let matched = tokens.iter().filter(|t| field.contains(**t)).count();
    KeywordOverlap {
        matched,
        total: tokens.len(),
    }
}
