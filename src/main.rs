use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use name_reconcile::batch::run_batch;
use name_reconcile::config::RunConfig;
use name_reconcile::loader::{read_candidates, read_legacy_names, read_overrides};
use name_reconcile::matcher::{NameField, NameMatcher};
use name_reconcile::models::{CandidateEntity, OverrideTable};
use name_reconcile::progress::{format_duration, set_log_only};
use name_reconcile::report::{output_paths, write_all, UNRESOLVED_CSV};
use name_reconcile::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "name-reconcile")]
#[command(about = "Resolve legacy client names against the canonical client list")]
struct Args {
    /// Legacy CSV export containing the free-text names
    legacy: PathBuf,

    /// Candidate snapshot: CSV, or SQLite (.sqlite/.sqlite3/.db)
    candidates: PathBuf,

    /// Manual override table (legacy_name,id,canonical_name)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Directory for the report files
    #[arg(long, default_value = "reconcile-out")]
    out_dir: PathBuf,

    /// JSON config with matcher thresholds and input schema
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Column in the legacy CSV holding the names
    #[arg(long)]
    legacy_column: Option<String>,

    #[arg(long)]
    fuzzy_threshold: Option<f64>,

    #[arg(long)]
    keyword_threshold: Option<f64>,

    /// Keyword tokens shorter than this are ignored
    #[arg(long)]
    min_token_len: Option<usize>,

    /// Fold accents and non-Latin scripts to ASCII before comparing
    #[arg(long)]
    fold_diacritics: bool,

    /// Overwrite existing report files
    #[arg(long)]
    force: bool,

    /// Hide progress bars and log progress lines instead
    #[arg(long)]
    log_only: bool,

    /// Print the score breakdown for one legacy name after the run
    #[arg(long)]
    explain: Option<String>,
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = RunConfig::load(args.config.as_deref())?;
    if let Some(column) = &args.legacy_column {
        config.schema.legacy_column = column.clone();
    }
    if let Some(t) = args.fuzzy_threshold {
        config.matcher.fuzzy_threshold = t;
    }
    if let Some(t) = args.keyword_threshold {
        config.matcher.keyword_threshold = t;
    }
    if let Some(n) = args.min_token_len {
        config.matcher.min_keyword_token_len = n;
    }
    if args.fold_diacritics {
        config.matcher.fold_diacritics = true;
    }
    config.matcher.validate()?;
    Ok(config)
}

fn explain(candidates: &[CandidateEntity], overrides: &OverrideTable, config: &RunConfig, name: &str) {
    let matcher = NameMatcher::new(candidates, overrides, config.matcher.clone());
    let e = matcher.explain(name, 5);

    println!("\nExplain {:?}:", name);
    println!("{:-<80}", "");
    println!("  normalized: {:?}", e.normalized);
    println!("  keywords:   {:?}", e.keyword_tokens);
    println!(
        "  decision:   {} -> {} ({:.4})",
        e.result.source(),
        e.result.matched_id().unwrap_or("-"),
        e.result.confidence()
    );
    if e.top_fields.is_empty() {
        println!("  no candidates");
        return;
    }
    for f in &e.top_fields {
        let field = match f.field {
            NameField::Primary => "primary",
            NameField::Alternate => "alternate",
        };
        println!(
            "  [{}] {:<9} sim={:.4} keywords={}/{}  {}",
            f.candidate_id, field, f.similarity, f.keyword.matched, f.keyword.total, f.text
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let config = build_config(&args)?;
    let start = Instant::now();

    let mut sources: Vec<&Path> = vec![args.legacy.as_path(), args.candidates.as_path()];
    sources.extend(args.overrides.as_deref());
    sources.extend(args.config.as_deref());
    for output in output_paths(&args.out_dir) {
        validate_output_path(&output, &sources, args.force)?;
    }

    info!("Reading legacy names from {:?}", args.legacy);
    let legacy = read_legacy_names(&args.legacy, &config.schema.legacy_column)?;
    let candidates = read_candidates(&args.candidates, &config.schema)?;
    let overrides = match &args.overrides {
        Some(path) => read_overrides(path)?,
        None => {
            warn!("No override table given: known irregular names will go through automatic matching");
            OverrideTable::new()
        }
    };

    let mut outcome = run_batch(&legacy.names, &candidates, &overrides, &config.matcher);
    outcome.stats.legacy_rows = legacy.rows;

    write_all(&args.out_dir, &outcome)?;
    outcome.stats.log_summary();

    let unresolved = outcome.unresolved();
    if !unresolved.is_empty() {
        warn!(
            "{} names unresolved, see {}",
            unresolved.len(),
            args.out_dir.join(UNRESOLVED_CSV).display()
        );
    }

    println!("\n{:=<60}", "");
    println!("Reconciliation complete!");
    println!("  Legacy rows: {}", legacy.rows);
    println!("  Distinct names: {}", outcome.stats.distinct_names);
    println!("  Resolved: {} ({:.1}%)", outcome.stats.resolved, outcome.stats.match_rate());
    println!("  Unresolved: {}", outcome.stats.unresolved);
    println!("  Output: {}", args.out_dir.display());
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    if let Some(name) = &args.explain {
        explain(&candidates, &overrides, &config, name);
    }

    Ok(())
}
