//! Input loading: legacy export, candidate snapshot and override table.
//!
//! Everything is read once at the start of a run and held in memory.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rusqlite::{Connection, OpenFlags};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::Path;

use crate::config::SchemaConfig;
use crate::models::{CandidateEntity, OverrideTable};
use crate::progress::create_spinner;

/// Distinct legacy names in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LegacyNames {
    pub names: Vec<String>,
    pub rows: usize,
}

fn column_index(headers: &csv::StringRecord, column: &str, path: &Path) -> Result<usize> {
    match headers.iter().position(|h| h.trim() == column) {
        Some(idx) => Ok(idx),
        None => bail!(
            "Column '{}' not found in {} (available: {})",
            column,
            path.display(),
            headers.iter().collect::<Vec<_>>().join(", ")
        ),
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

// ============================================================================
// Legacy Names
// ============================================================================

/// Read the distinct values of `column` from a legacy CSV export.
///
/// Values are kept verbatim (override keys are exact strings). A blank cell is
/// kept as the empty name so it still appears in the report.
pub fn read_legacy_names(path: &Path, column: &str) -> Result<LegacyNames> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let idx = column_index(&headers, column, path)?;

    let spinner = create_spinner("Reading legacy names");
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = LegacyNames::default();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed row {} in {}", line + 2, path.display()))?;
        out.rows += 1;
        let name = record.get(idx).unwrap_or("");
        if seen.insert(name.to_string()) {
            out.names.push(name.to_string());
        }
    }

    spinner.finish_with_message(format!(
        "Read {} rows, {} distinct legacy names",
        out.rows,
        out.names.len()
    ));
    Ok(out)
}

// ============================================================================
// Candidates
// ============================================================================

fn is_sqlite_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("sqlite" | "sqlite3" | "db")
    )
}

/// Load the candidate snapshot from a SQLite file or a CSV export,
/// chosen by file extension.
pub fn read_candidates(path: &Path, schema: &SchemaConfig) -> Result<Vec<CandidateEntity>> {
    let candidates = if is_sqlite_path(path) {
        read_candidates_sqlite(path, schema)?
    } else {
        read_candidates_csv(path, schema)?
    };
    info!("Loaded {} candidates from {}", candidates.len(), path.display());
    Ok(candidates)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_candidates_csv(path: &Path, schema: &SchemaConfig) -> Result<Vec<CandidateEntity>> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let id_idx = column_index(&headers, &schema.id_column, path)?;
    let name_idx = column_index(&headers, &schema.name_column, path)?;
    let alt_idx = match &schema.alternate_column {
        Some(col) => {
            let idx = headers.iter().position(|h| h.trim() == col);
            if idx.is_none() {
                warn!(
                    "Alternate column '{}' not in {}, matching on primary names only",
                    col,
                    path.display()
                );
            }
            idx
        }
        None => None,
    };

    let mut candidates = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(id) = non_empty(record.get(id_idx)) else {
            skipped += 1;
            continue;
        };
        candidates.push(CandidateEntity {
            id,
            primary_name: record.get(name_idx).unwrap_or("").to_string(),
            alternate_name: alt_idx.and_then(|i| non_empty(record.get(i))),
        });
    }
    if skipped > 0 {
        warn!("Skipped {} candidate rows without an id", skipped);
    }
    Ok(candidates)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn has_rowid(conn: &Connection, table: &str) -> bool {
    conn.prepare(&format!("SELECT rowid FROM {} LIMIT 0", table)).is_ok()
}

fn read_candidates_sqlite(path: &Path, schema: &SchemaConfig) -> Result<Vec<CandidateEntity>> {
    schema.validate_sql_identifiers()?;
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open candidate database {}", path.display()))?;

    let columns = table_columns(&conn, &schema.candidate_table)?;
    if columns.is_empty() {
        bail!("Table '{}' not found in {}", schema.candidate_table, path.display());
    }
    let alt = schema.alternate_column.as_ref().filter(|c| {
        let present = columns.iter().any(|col| col == *c);
        if !present {
            warn!(
                "Alternate column '{}' not in table '{}', matching on primary names only",
                c, schema.candidate_table
            );
        }
        present
    });

    // Views and WITHOUT ROWID tables are read in their natural scan order.
    let order = if has_rowid(&conn, &schema.candidate_table) {
        " ORDER BY rowid"
    } else {
        ""
    };
    let sql = format!(
        "SELECT CAST({id} AS TEXT), CAST({name} AS TEXT), {alt} FROM {table}{order}",
        id = schema.id_column,
        name = schema.name_column,
        alt = alt.map(|c| format!("CAST({} AS TEXT)", c)).unwrap_or_else(|| "NULL".to_string()),
        table = schema.candidate_table,
    );

    let spinner = create_spinner("Reading candidates");
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to query '{}' in {}", schema.candidate_table, path.display()))?;
    let mut rows = stmt.query([])?;
    let mut candidates = Vec::new();
    let mut skipped = 0usize;

    while let Some(row) = rows.next()? {
        let id: Option<String> = row.get(0)?;
        let Some(id) = non_empty(id.as_deref()) else {
            skipped += 1;
            continue;
        };
        let name: Option<String> = row
            .get(1)
            .with_context(|| format!("Bad name for candidate {} in {}", id, path.display()))?;
        let alternate: Option<String> = row
            .get(2)
            .with_context(|| format!("Bad alternate name for candidate {} in {}", id, path.display()))?;
        candidates.push(CandidateEntity {
            id,
            primary_name: name.unwrap_or_default(),
            alternate_name: non_empty(alternate.as_deref()),
        });
    }

    spinner.finish_with_message(format!("Read {} candidates", candidates.len()));
    if skipped > 0 {
        warn!("Skipped {} candidate rows without an id", skipped);
    }
    Ok(candidates)
}

// ============================================================================
// Overrides
// ============================================================================

#[derive(Debug, Deserialize)]
struct OverrideRow {
    legacy_name: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    canonical_name: String,
}

/// Read an operator override table (`legacy_name,id,canonical_name`).
///
/// Keys are exact strings. Repeated keys keep the last row.
pub fn read_overrides(path: &Path) -> Result<OverrideTable> {
    let mut reader = open_csv(path)?;
    let mut table = OverrideTable::new();
    for (line, row) in reader.deserialize::<OverrideRow>().enumerate() {
        let row = row.with_context(|| format!("Bad override row {} in {}", line + 2, path.display()))?;
        table.insert(row.legacy_name, row.id, row.canonical_name);
    }
    info!(
        "Loaded {} overrides from {} ({} duplicate keys)",
        table.len(),
        path.display(),
        table.duplicates().len()
    );
    Ok(table)
}
