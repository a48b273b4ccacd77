//! Core data models for legacy name reconciliation.
//!
//! This module contains the reference records, operator overrides, match
//! results and run statistics shared by the matcher, the batch driver and
//! the report writer.

use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Reference Store Models
// ============================================================================

/// Canonical record loaded from the reference store snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateEntity {
    pub id: String,
    pub primary_name: String,
    pub alternate_name: Option<String>, // Trade name, when the store has one
}

impl CandidateEntity {
    pub fn new(id: impl Into<String>, primary_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            primary_name: primary_name.into(),
            alternate_name: None,
        }
    }

    pub fn with_alternate(mut self, alternate_name: impl Into<String>) -> Self {
        self.alternate_name = Some(alternate_name.into());
        self
    }
}

// ============================================================================
// Manual Overrides
// ============================================================================

/// Operator-authored mapping for a legacy name that automatic matching gets wrong.
/// An empty `id` marks a name as deliberately unmapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualOverride {
    pub id: String,
    pub canonical_name: String,
}

impl ManualOverride {
    pub fn is_unmapped(&self) -> bool {
        self.id.trim().is_empty()
    }
}

/// Override table keyed by the exact legacy name string.
///
/// Hand-edited tables often repeat a key; the last registration wins and the
/// replaced target is remembered so the driver can report it.
#[derive(Clone, Debug, Default)]
pub struct OverrideTable {
    entries: FxHashMap<String, ManualOverride>,
    duplicates: Vec<DuplicateOverride>,
}

/// A key registered more than once, with the target that got replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateOverride {
    pub legacy_name: String,
    pub replaced: ManualOverride,
    pub kept: ManualOverride,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override. A repeated key replaces the earlier entry.
    pub fn insert(
        &mut self,
        legacy_name: impl Into<String>,
        id: impl Into<String>,
        canonical_name: impl Into<String>,
    ) {
        let legacy_name = legacy_name.into();
        let entry = ManualOverride {
            id: id.into(),
            canonical_name: canonical_name.into(),
        };
        if let Some(replaced) = self.entries.insert(legacy_name.clone(), entry.clone()) {
            warn!(
                "Duplicate override for {:?}: {:?} replaced by {:?}",
                legacy_name, replaced.id, entry.id
            );
            self.duplicates.push(DuplicateOverride {
                legacy_name,
                replaced,
                kept: entry,
            });
        }
    }

    pub fn get(&self, legacy_name: &str) -> Option<&ManualOverride> {
        self.entries.get(legacy_name)
    }

    pub fn duplicates(&self) -> &[DuplicateOverride] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, I, N> FromIterator<(K, I, N)> for OverrideTable
where
    K: Into<String>,
    I: Into<String>,
    N: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I, N)>>(iter: T) -> Self {
        let mut table = OverrideTable::new();
        for (legacy_name, id, canonical_name) in iter {
            table.insert(legacy_name, id, canonical_name);
        }
        table
    }
}

// ============================================================================
// Match Results
// ============================================================================

/// Strategy that produced a match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    Manual,
    ExactPrimary,
    ExactAlternate,
    Fuzzy,
    Keyword,
    None,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Manual => "manual",
            MatchSource::ExactPrimary => "exact-primary",
            MatchSource::ExactAlternate => "exact-alternate",
            MatchSource::Fuzzy => "fuzzy",
            MatchSource::Keyword => "keyword",
            MatchSource::None => "none",
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one distinct legacy name.
///
/// Fields are private so the only way to get `matched_id == None` is
/// [`MatchResult::unmatched`], which also pins the source to `none` and the
/// confidence to zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    legacy_name: String,
    matched_id: Option<String>,
    matched_name: Option<String>,
    confidence: f64,
    source: MatchSource,
}

impl MatchResult {
    /// A successful match. `source` must not be [`MatchSource::None`].
    pub fn matched(
        legacy_name: &str,
        id: &str,
        name: &str,
        confidence: f64,
        source: MatchSource,
    ) -> Self {
        debug_assert!(source != MatchSource::None);
        Self {
            legacy_name: legacy_name.to_string(),
            matched_id: Some(id.to_string()),
            matched_name: Some(name.to_string()),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn unmatched(legacy_name: &str) -> Self {
        Self {
            legacy_name: legacy_name.to_string(),
            matched_id: None,
            matched_name: None,
            confidence: 0.0,
            source: MatchSource::None,
        }
    }

    pub fn legacy_name(&self) -> &str {
        &self.legacy_name
    }

    pub fn matched_id(&self) -> Option<&str> {
        self.matched_id.as_deref()
    }

    pub fn matched_name(&self) -> Option<&str> {
        self.matched_name.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn source(&self) -> MatchSource {
        self.source
    }

    pub fn is_resolved(&self) -> bool {
        self.matched_id.is_some()
    }

    /// Manual override with an empty id: known, and intentionally left unmapped.
    pub fn is_deliberately_unmapped(&self) -> bool {
        self.source == MatchSource::Manual
            && self.matched_id.as_deref().is_some_and(|id| id.trim().is_empty())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-run matching statistics, written next to the report.
#[derive(Default, Debug, Clone, Serialize)]
pub struct MatchingStats {
    // Inputs
    pub legacy_rows: usize,
    pub distinct_names: usize,
    pub candidates: usize,
    pub overrides: usize,
    pub duplicate_override_keys: usize,

    // Per-source counts
    pub manual: usize,
    pub exact_primary: usize,
    pub exact_alternate: usize,
    pub fuzzy: usize,
    pub keyword: usize,
    pub none: usize,

    // Partitions
    pub resolved: usize,
    pub unresolved: usize,
    pub deliberately_unmapped: usize,

    pub elapsed_seconds: f64,
}

impl MatchingStats {
    pub fn record(&mut self, result: &MatchResult) {
        match result.source() {
            MatchSource::Manual => self.manual += 1,
            MatchSource::ExactPrimary => self.exact_primary += 1,
            MatchSource::ExactAlternate => self.exact_alternate += 1,
            MatchSource::Fuzzy => self.fuzzy += 1,
            MatchSource::Keyword => self.keyword += 1,
            MatchSource::None => self.none += 1,
        }
        if result.is_resolved() {
            self.resolved += 1;
        } else {
            self.unresolved += 1;
        }
        if result.is_deliberately_unmapped() {
            self.deliberately_unmapped += 1;
        }
    }

    /// Share of distinct names that resolved, as a percentage.
    pub fn match_rate(&self) -> f64 {
        if self.distinct_names == 0 {
            0.0
        } else {
            100.0 * self.resolved as f64 / self.distinct_names as f64
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Matched {}/{} distinct names ({:.1}%): manual={} exact-primary={} exact-alternate={} fuzzy={} keyword={} none={}",
            self.resolved,
            self.distinct_names,
            self.match_rate(),
            self.manual,
            self.exact_primary,
            self.exact_alternate,
            self.fuzzy,
            self.keyword,
            self.none,
        );
        if self.deliberately_unmapped > 0 {
            info!(
                "{} names are deliberately unmapped by override",
                self.deliberately_unmapped
            );
        }
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
