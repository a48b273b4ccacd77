//! Run configuration: matcher thresholds plus the input schema.
//!
//! Defaults live in code; an optional JSON file overrides them and CLI flags
//! override the file.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scoring::{FUZZY_THRESHOLD, KEYWORD_THRESHOLD, MIN_KEYWORD_MATCHES, MIN_KEYWORD_TOKEN_LEN};

/// Plain SQL identifier; table and column names are interpolated into a query.
static SQL_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Tunables for [`crate::matcher::NameMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub fuzzy_threshold: f64,
    pub keyword_threshold: f64,
    pub min_keyword_token_len: usize,
    pub min_keyword_matches: usize,
    pub fold_diacritics: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: FUZZY_THRESHOLD,
            keyword_threshold: KEYWORD_THRESHOLD,
            min_keyword_token_len: MIN_KEYWORD_TOKEN_LEN,
            min_keyword_matches: MIN_KEYWORD_MATCHES,
            fold_diacritics: false,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("keyword_threshold", self.keyword_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0 and 1, got {}", name, value);
            }
        }
        if self.min_keyword_token_len == 0 {
            bail!("min_keyword_token_len must be at least 1");
        }
        Ok(())
    }
}

/// Column and table names for the legacy export and the reference snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub legacy_column: String,
    pub candidate_table: String,
    pub id_column: String,
    pub name_column: String,
    pub alternate_column: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            legacy_column: "client_name".into(),
            candidate_table: "clients".into(),
            id_column: "id".into(),
            name_column: "name".into(),
            alternate_column: Some("trade_name".into()),
        }
    }
}

impl SchemaConfig {
    /// Identifiers used in the SQLite candidate query.
    pub fn validate_sql_identifiers(&self) -> Result<()> {
        let mut idents = vec![&self.candidate_table, &self.id_column, &self.name_column];
        if let Some(alt) = &self.alternate_column {
            idents.push(alt);
        }
        for ident in idents {
            if !SQL_IDENTIFIER.is_match(ident) {
                bail!("'{}' is not a valid SQL identifier", ident);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub matcher: MatcherConfig,
    pub schema: SchemaConfig,
}

impl RunConfig {
    /// Load from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RunConfig::default(),
        };
        config.matcher.validate()?;
        Ok(config)
    }
}
