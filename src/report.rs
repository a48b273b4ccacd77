//! Report writers for human review and for the bulk-insert step.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::batch::BatchOutcome;
use crate::models::{MatchResult, MatchingStats};
use crate::progress::{create_progress_bar, log_progress};

pub const REPORT_CSV: &str = "match_report.csv";
pub const REPORT_JSON: &str = "match_report.json";
pub const PAIRS_CSV: &str = "match_pairs.csv";
pub const UNRESOLVED_CSV: &str = "unresolved.csv";
pub const STATS_JSON: &str = "match_stats.json";

/// Every file a run writes, relative to the output directory.
pub fn output_paths(out_dir: &Path) -> Vec<PathBuf> {
    [REPORT_CSV, REPORT_JSON, PAIRS_CSV, UNRESOLVED_CSV, STATS_JSON]
        .iter()
        .map(|name| out_dir.join(name))
        .collect()
}

#[derive(Serialize)]
struct ReportRow<'a> {
    legacy_name: &'a str,
    matched_id: Option<&'a str>,
    matched_name: Option<&'a str>,
    confidence: String,
    match_source: &'static str,
}

impl<'a> From<&'a MatchResult> for ReportRow<'a> {
    fn from(r: &'a MatchResult) -> Self {
        Self {
            legacy_name: r.legacy_name(),
            matched_id: r.matched_id(),
            matched_name: r.matched_name(),
            confidence: format!("{:.4}", r.confidence()),
            match_source: r.source().as_str(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    stats: &'a MatchingStats,
    results: &'a [MatchResult],
    resolved: Vec<&'a str>,
    unresolved: Vec<&'a str>,
}

/// Full review report: one row per legacy name, in input order.
pub fn write_report_csv(path: &Path, results: &[MatchResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for r in results {
        writer.serialize(ReportRow::from(r))?;
    }
    writer.flush()?;
    Ok(())
}

/// `(legacy_name, matched_id)` pairs for the bulk insert.
///
/// Deliberately unmapped overrides are left out: an empty id is not insertable.
pub fn write_pairs_csv(path: &Path, results: &[MatchResult]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    // Header is written explicitly so an all-unresolved run still gets one.
    writer.write_record(["legacy_name", "matched_id"])?;
    let mut written = 0;
    for r in results.iter().filter(|r| !r.is_deliberately_unmapped()) {
        if let Some(id) = r.matched_id() {
            writer.write_record([r.legacy_name(), id])?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

pub fn write_unresolved_csv(path: &Path, results: &[MatchResult]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["legacy_name"])?;
    let mut written = 0;
    for r in results.iter().filter(|r| !r.is_resolved()) {
        writer.write_record([r.legacy_name()])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

pub fn write_report_json(path: &Path, outcome: &BatchOutcome) -> Result<()> {
    let report = JsonReport {
        stats: &outcome.stats,
        results: &outcome.results,
        resolved: outcome.resolved().iter().map(|r| r.legacy_name()).collect(),
        unresolved: outcome.unresolved().iter().map(|r| r.legacy_name()).collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write every report file into `out_dir`, creating it if needed.
pub fn write_all(out_dir: &Path, outcome: &BatchOutcome) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let paths = output_paths(out_dir);
    let total = paths.len() as u64;
    let pb = create_progress_bar(total, "Writing reports");
    for (i, path) in paths.iter().enumerate() {
        let file = path.file_name().and_then(|f| f.to_str()).unwrap_or_default();
        match file {
            REPORT_CSV => write_report_csv(path, &outcome.results)?,
            REPORT_JSON => write_report_json(path, outcome)?,
            PAIRS_CSV => {
                let written = write_pairs_csv(path, &outcome.results)?;
                info!("Wrote {} insertable pairs to {}", written, path.display());
            }
            UNRESOLVED_CSV => {
                write_unresolved_csv(path, &outcome.results)?;
            }
            _ => outcome.stats.write_to_file(path)?,
        }
        pb.inc(1);
        log_progress("write", i as u64 + 1, total, 1);
    }
    pb.finish_with_message(format!("Wrote {} report files", total));
    Ok(())
}
