//! Legacy name resolution against the candidate reference list.
//!
//! Strategies run in strict priority order and the first hit wins:
//! 1. Manual override (exact key, un-normalized)
//! 2. Exact normalized match on primary names, then alternate names
//! 3. Fuzzy match on normalized Levenshtein similarity
//! 4. Keyword overlap
//!
//! Matching is pure: the same inputs always give the same [`MatchResult`].

use rustc_hash::FxHashMap;

use crate::config::MatcherConfig;
use crate::models::{CandidateEntity, MatchResult, MatchSource, OverrideTable};
use crate::normalize::{keyword_tokens, normalize_name};
use crate::scoring::{keyword_overlap, levenshtein_similarity, KeywordOverlap};

/// Which candidate name field a comparison ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Primary,
    Alternate,
}

/// Candidate with its name fields normalized once per run.
#[derive(Debug)]
struct PreparedCandidate<'a> {
    entity: &'a CandidateEntity,
    primary_norm: String,
    alternate_norm: Option<String>,
}

impl PreparedCandidate<'_> {
    /// Comparison targets, primary first.
    fn fields(&self) -> impl Iterator<Item = (NameField, &str)> {
        std::iter::once((NameField::Primary, self.primary_norm.as_str())).chain(
            self.alternate_norm
                .as_deref()
                .map(|alt| (NameField::Alternate, alt)),
        )
    }
}

/// Resolves legacy names against a fixed candidate list and override table.
///
/// Holds only borrowed, read-only inputs, so one matcher can be shared across
/// rayon workers.
pub struct NameMatcher<'a> {
    config: MatcherConfig,
    candidates: Vec<PreparedCandidate<'a>>,
    overrides: &'a OverrideTable,
    // normalized name -> first candidate index carrying it
    exact_primary: FxHashMap<String, usize>,
    exact_alternate: FxHashMap<String, usize>,
}

impl<'a> NameMatcher<'a> {
    pub fn new(
        candidates: &'a [CandidateEntity],
        overrides: &'a OverrideTable,
        config: MatcherConfig,
    ) -> Self {
        let fold = config.fold_diacritics;
        let prepared: Vec<PreparedCandidate<'a>> = candidates
            .iter()
            .map(|entity| PreparedCandidate {
                entity,
                primary_norm: normalize_name(&entity.primary_name, fold),
                alternate_norm: entity
                    .alternate_name
                    .as_deref()
                    .map(|alt| normalize_name(alt, fold)),
            })
            .collect();

        let mut exact_primary = FxHashMap::default();
        let mut exact_alternate = FxHashMap::default();
        for (idx, c) in prepared.iter().enumerate() {
            // Empty fields never match anything exactly.
            if !c.primary_norm.is_empty() {
                exact_primary.entry(c.primary_norm.clone()).or_insert(idx);
            }
            if let Some(alt) = c.alternate_norm.as_ref().filter(|a| !a.is_empty()) {
                exact_alternate.entry(alt.clone()).or_insert(idx);
            }
        }

        Self {
            config,
            candidates: prepared,
            overrides,
            exact_primary,
            exact_alternate,
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Resolve one legacy name. Never fails; unusable input yields `none`.
    pub fn match_name(&self, legacy_name: &str) -> MatchResult {
        if let Some(o) = self.overrides.get(legacy_name) {
            return MatchResult::matched(legacy_name, &o.id, &o.canonical_name, 1.0, MatchSource::Manual);
        }

        let norm = normalize_name(legacy_name, self.config.fold_diacritics);
        if norm.is_empty() {
            return MatchResult::unmatched(legacy_name);
        }

        if let Some(&idx) = self.exact_primary.get(&norm) {
            return self.hit(legacy_name, idx, 1.0, MatchSource::ExactPrimary);
        }
        if let Some(&idx) = self.exact_alternate.get(&norm) {
            return self.hit(legacy_name, idx, 1.0, MatchSource::ExactAlternate);
        }

        if let Some((idx, score)) = self.best_fuzzy(&norm) {
            if score >= self.config.fuzzy_threshold {
                return self.hit(legacy_name, idx, score, MatchSource::Fuzzy);
            }
        }

        if let Some((idx, overlap)) = self.best_keyword(&norm) {
            if overlap.score() >= self.config.keyword_threshold
                && overlap.matched >= self.config.min_keyword_matches
            {
                return self.hit(legacy_name, idx, overlap.score(), MatchSource::Keyword);
            }
        }

        MatchResult::unmatched(legacy_name)
    }

    fn hit(&self, legacy_name: &str, idx: usize, confidence: f64, source: MatchSource) -> MatchResult {
        let entity = self.candidates[idx].entity;
        MatchResult::matched(legacy_name, &entity.id, &entity.primary_name, confidence, source)
    }

    /// Highest similarity over every candidate field; ties keep the first seen.
    fn best_fuzzy(&self, norm: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, c) in self.candidates.iter().enumerate() {
            for (_, field) in c.fields() {
                let score = levenshtein_similarity(norm, field);
                if best.map_or(true, |(_, b)| score > b) {
                    best = Some((idx, score));
                }
            }
        }
        best
    }

    /// Highest keyword overlap over every candidate field; ties keep the first seen.
    fn best_keyword(&self, norm: &str) -> Option<(usize, KeywordOverlap)> {
        let tokens = keyword_tokens(norm, self.config.min_keyword_token_len);
        if tokens.is_empty() {
            return None;
        }
        let mut best: Option<(usize, KeywordOverlap)> = None;
        for (idx, c) in self.candidates.iter().enumerate() {
            for (_, field) in c.fields() {
                let overlap = keyword_overlap(&tokens, field);
                if best.map_or(true, |(_, b)| overlap.score() > b.score()) {
                    best = Some((idx, overlap));
                }
            }
        }
        best
    }

    /// Score breakdown for one legacy name, for operators writing overrides.
    pub fn explain(&self, legacy_name: &str, top: usize) -> Explanation {
        let norm = normalize_name(legacy_name, self.config.fold_diacritics);
        let tokens = keyword_tokens(&norm, self.config.min_keyword_token_len);

        let mut fields: Vec<FieldScore> = self
            .candidates
            .iter()
            .flat_map(|c| {
                let tokens = &tokens;
                let norm = &norm;
                c.fields().map(move |(field, text)| FieldScore {
                    candidate_id: c.entity.id.clone(),
                    field,
                    text: text.to_string(),
                    similarity: levenshtein_similarity(norm, text),
                    keyword: keyword_overlap(tokens, text),
                })
            })
            .collect();
        // Stable sort keeps input order among equal scores.
        fields.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        fields.truncate(top);

        Explanation {
            normalized: norm.clone(),
            keyword_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            result: self.match_name(legacy_name),
            top_fields: fields,
        }
    }
}

/// Convenience wrapper: match one name with default thresholds.
pub fn match_name(
    legacy_name: &str,
    candidates: &[CandidateEntity],
    overrides: &OverrideTable,
) -> MatchResult {
    NameMatcher::new(candidates, overrides, MatcherConfig::default()).match_name(legacy_name)
}

/// One candidate field scored against a legacy name.
#[derive(Debug, Clone)]
pub struct FieldScore {
    pub candidate_id: String,
    pub field: NameField,
    pub text: String,
    pub similarity: f64,
    pub keyword: KeywordOverlap,
}

#[derive(Debug, Clone)]
pub struct Explanation {
    pub normalized: String,
    pub keyword_tokens: Vec<String>,
    pub result: MatchResult,
    pub top_fields: Vec<FieldScore>,
}
