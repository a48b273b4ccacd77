//! Batch driver: one matcher call per distinct legacy name.
//!
//! Names are matched in parallel but results always come back in input order,
//! so reports stay diffable between runs.

use log::warn;
use rayon::prelude::*;
use std::time::Instant;

use crate::config::MatcherConfig;
use crate::matcher::NameMatcher;
use crate::models::{CandidateEntity, MatchResult, MatchingStats, OverrideTable};
use crate::progress::{create_progress_bar, log_progress};

const PROGRESS_LOG_INTERVAL: u64 = 1_000;

/// All results of a run plus its statistics.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<MatchResult>,
    pub stats: MatchingStats,
}

impl BatchOutcome {
    /// Results carrying an id, in input order. Deliberately unmapped overrides are included.
    pub fn resolved(&self) -> Vec<&MatchResult> {
        self.results.iter().filter(|r| r.is_resolved()).collect()
    }

    /// Results with no id, in input order, for manual follow-up.
    pub fn unresolved(&self) -> Vec<&MatchResult> {
        self.results.iter().filter(|r| !r.is_resolved()).collect()
    }
}

/// Match every name against `candidates` and `overrides`.
///
/// Never stops on an unresolved name. An empty candidate list is allowed but
/// almost certainly a misconfigured run, so it is logged as a warning.
pub fn run_batch(
    names: &[String],
    candidates: &[CandidateEntity],
    overrides: &OverrideTable,
    config: &MatcherConfig,
) -> BatchOutcome {
    let start = Instant::now();

    if candidates.is_empty() {
        warn!(
            "No candidates loaded: all {} names will resolve only through overrides",
            names.len()
        );
    }

    let matcher = NameMatcher::new(candidates, overrides, config.clone());
    let total = names.len() as u64;
    let pb = create_progress_bar(total, "Matching legacy names");

    // Indexed parallel collect preserves input order.
    let results: Vec<MatchResult> = names
        .par_iter()
        .map(|name| {
            let result = matcher.match_name(name);
            pb.inc(1);
            log_progress("match", pb.position(), total, PROGRESS_LOG_INTERVAL);
            result
        })
        .collect();

    pb.finish_with_message(format!("Matched {} names", results.len()));

    let mut stats = MatchingStats {
        distinct_names: names.len(),
        candidates: candidates.len(),
        overrides: overrides.len(),
        duplicate_override_keys: overrides.duplicates().len(),
        ..Default::default()
    };
    for result in &results {
        stats.record(result);
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    BatchOutcome { results, stats }
}
