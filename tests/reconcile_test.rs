//! End-to-end reconciliation: CSV inputs through to the report files.

use name_reconcile::batch::run_batch;
use name_reconcile::config::{RunConfig, SchemaConfig};
use name_reconcile::loader::{read_candidates, read_legacy_names, read_overrides};
use name_reconcile::report::{write_all, PAIRS_CSV, REPORT_CSV, REPORT_JSON, STATS_JSON, UNRESOLVED_CSV};
use name_reconcile::safety::validate_output_path;
use name_reconcile::scoring::levenshtein_similarity;
use name_reconcile::{match_name, CandidateEntity, MatchSource, OverrideTable};
use std::path::Path;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn test_full_run_writes_reports() {
    let dir = tempdir().expect("Failed to create temp dir");
    let legacy = write(
        dir.path(),
        "invoices.csv",
        "invoice_no,client_name,amount\n\
         INV-1,RUCHI AGRITRADING PTE LTD,100\n\
         INV-2,Olam International Limited,50\n\
         INV-3,olam internatonal limited,75\n\
         INV-4,Fortune,20\n\
         INV-5,CASH,5\n\
         INV-6,Totally Unknown Trader,1\n\
         INV-7,Olam International Limited,9\n",
    );
    let candidates = write(
        dir.path(),
        "clients.csv",
        "id,name,trade_name\n\
         1,Ruchi Soya Industries Limited,\n\
         2,Olam International Limited,\n\
         3,Adani Wilmar Limited,Fortune\n",
    );
    let overrides = write(
        dir.path(),
        "overrides.csv",
        "legacy_name,id,canonical_name\n\
         RUCHI AGRITRADING PTE LTD,1,Ruchi Soya Industries Limited\n\
         CASH,,\n",
    );

    let config = RunConfig::default();
    let names = read_legacy_names(&legacy, &config.schema.legacy_column).unwrap();
    assert_eq!(names.rows, 7);
    assert_eq!(names.names.len(), 6);

    let candidates = read_candidates(&candidates, &config.schema).unwrap();
    let overrides = read_overrides(&overrides).unwrap();
    let outcome = run_batch(&names.names, &candidates, &overrides, &config.matcher);

    let sources: Vec<MatchSource> = outcome.results.iter().map(|r| r.source()).collect();
    assert_eq!(
        sources,
        vec![
            MatchSource::Manual,
            MatchSource::ExactPrimary,
            MatchSource::Fuzzy,
            MatchSource::ExactAlternate,
            MatchSource::Manual,
            MatchSource::None,
        ]
    );

    let out_dir = dir.path().join("out");
    write_all(&out_dir, &outcome).unwrap();

    let report = std::fs::read_to_string(out_dir.join(REPORT_CSV)).unwrap();
    assert_eq!(report.lines().count(), 7);
    assert!(report.contains("RUCHI AGRITRADING PTE LTD,1,Ruchi Soya Industries Limited,1.0000,manual"));
    assert!(report.contains("Fortune,3,Adani Wilmar Limited,1.0000,exact-alternate"));
    assert!(report.contains("Totally Unknown Trader,,,0.0000,none"));

    let pairs = std::fs::read_to_string(out_dir.join(PAIRS_CSV)).unwrap();
    assert!(pairs.starts_with("legacy_name,matched_id\n"));
    assert!(!pairs.contains("CASH"));
    assert_eq!(pairs.lines().count(), 5);

    let unresolved = std::fs::read_to_string(out_dir.join(UNRESOLVED_CSV)).unwrap();
    assert_eq!(unresolved, "legacy_name\nTotally Unknown Trader\n");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join(REPORT_JSON)).unwrap()).unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 6);
    assert_eq!(json["results"][2]["source"], "fuzzy");
    assert_eq!(
        json["resolved"],
        serde_json::json!([
            "RUCHI AGRITRADING PTE LTD",
            "Olam International Limited",
            "olam internatonal limited",
            "Fortune",
            "CASH"
        ])
    );
    assert_eq!(json["unresolved"], serde_json::json!(["Totally Unknown Trader"]));

    let stats: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join(STATS_JSON)).unwrap()).unwrap();
    assert_eq!(stats["resolved"], 5);
    assert_eq!(stats["deliberately_unmapped"], 1);
}

#[test]
fn test_rerun_is_identical() {
    let candidates = vec![
        CandidateEntity::new("1", "Olam International Limited"),
        CandidateEntity::new("2", "Sumitomo Corporation Singapore Branch Office").with_alternate("SCSB"),
    ];
    let names: Vec<String> = ["Olam Internatonal Limited", "Singapore Sumitomo", "scsb", "", "nobody"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let config = RunConfig::default();
    let first = run_batch(&names, &candidates, &OverrideTable::new(), &config.matcher);
    let second = run_batch(&names, &candidates, &OverrideTable::new(), &config.matcher);
    assert_eq!(first.results, second.results);
}

#[test]
fn test_every_name_gets_one_result() {
    let names: Vec<String> = (0..250).map(|i| format!("legacy client {}", i)).collect();
    let candidates = vec![CandidateEntity::new("1", "legacy client 7")];
    let outcome = run_batch(&names, &candidates, &OverrideTable::new(), &RunConfig::default().matcher);
    assert_eq!(outcome.results.len(), names.len());
    assert_eq!(outcome.resolved().len() + outcome.unresolved().len(), names.len());
    for r in &outcome.results {
        if r.matched_id().is_none() {
            assert_eq!(r.source(), MatchSource::None);
            assert_eq!(r.confidence(), 0.0);
        }
    }
}

#[test]
fn test_manual_always_wins() {
    let candidates = vec![CandidateEntity::new("1", "Wilmar Trading Pte Ltd")];
    let overrides: OverrideTable = [("Wilmar Trading Pte Ltd", "99", "Wilmar International")]
        .into_iter()
        .collect();
    let r = match_name("Wilmar Trading Pte Ltd", &candidates, &overrides);
    assert_eq!(r.source(), MatchSource::Manual);
    assert_eq!(r.matched_id(), Some("99"));
    assert_eq!(r.matched_name(), Some("Wilmar International"));
}

#[test]
fn test_similarity_symmetric_over_corpus() {
    let corpus = [
        "",
        "a",
        "wilmar pte ltd",
        "wilmar trading pte ltd",
        "ruchi agritrading pte ltd",
        "ruchi soya industries limited",
        "société générale",
        "societe generale",
        "olam",
    ];
    for a in corpus {
        for b in corpus {
            assert_eq!(levenshtein_similarity(a, b), levenshtein_similarity(b, a), "{:?} / {:?}", a, b);
            let s = levenshtein_similarity(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
    }
}

#[test]
fn test_report_refuses_to_overwrite_inputs() {
    let dir = tempdir().unwrap();
    let legacy = write(dir.path(), "match_report.csv", "client_name\nOlam\n");
    let err = validate_output_path(&legacy, &[legacy.as_path()], true).unwrap_err();
    assert!(err.to_string().contains("cannot be the same as source"));
}

#[test]
fn test_custom_schema_columns() {
    let dir = tempdir().unwrap();
    let legacy = write(dir.path(), "orders.csv", "party\nAdani Wilmar Ltd\n");
    let candidates = write(dir.path(), "ref.csv", "client_id,client_name\nC-1,Adani Wilmar Limited\n");
    let schema = SchemaConfig {
        legacy_column: "party".into(),
        id_column: "client_id".into(),
        name_column: "client_name".into(),
        alternate_column: None,
        ..Default::default()
    };
    let names = read_legacy_names(&legacy, &schema.legacy_column).unwrap();
    let candidates = read_candidates(&candidates, &schema).unwrap();
    let outcome = run_batch(&names.names, &candidates, &OverrideTable::new(), &RunConfig::default().matcher);
    assert_eq!(outcome.results[0].matched_id(), Some("C-1"));
    assert_eq!(outcome.results[0].source(), MatchSource::Fuzzy);
}
