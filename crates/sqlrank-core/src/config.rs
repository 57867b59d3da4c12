//! Centralized configuration for sqlrank.
//!
//! Scoring constants, per-call search options and the JSON configuration
//! file describing a searchable table.

use crate::dialect::Dialect;
use crate::error::{Result, SearchError};
use crate::schema::TableSchema;
use crate::spec::SearchSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scoring constants.
pub struct ScoringConfig;

impl ScoringConfig {
    pub const EXACT_MULTIPLIER: f64 = 6.0;
    pub const PREFIX_MULTIPLIER: f64 = 4.0;
    pub const SUFFIX_MULTIPLIER: f64 = 2.0;
    pub const CONTAINS_MULTIPLIER: f64 = 1.0;
    pub const WHOLE_TEXT_EXACT_MULTIPLIER: f64 = 50.0;
    pub const WHOLE_TEXT_CONTAINS_MULTIPLIER: f64 = 30.0;

    /// Default threshold is the contributing weight divided by this.
    pub const DEFAULT_THRESHOLD_DIVISOR: f64 = 4.0;
    /// Decimal places of the threshold literal.
    pub const THRESHOLD_PRECISION: usize = 2;
    /// Maximum decimal places of a term contribution literal.
    pub const LITERAL_PRECISION: usize = 6;
    /// Alias of the computed score column.
    pub const RELEVANCE_ALIAS: &'static str = "relevance";
}

/// Options of a single search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Minimum relevance (exclusive). `None` derives it from the weights.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Also score the whole query as one phrase when it has several words.
    #[serde(default)]
    pub match_whole_text: bool,
    /// Score only the whole query as one phrase.
    #[serde(default)]
    pub match_whole_text_only: bool,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn whole_text(mut self) -> Self {
        self.match_whole_text = true;
        self
    }

    pub fn whole_text_only(mut self) -> Self {
        self.match_whole_text_only = true;
        self
    }

    /// An explicit threshold must be a finite number.
    pub fn validate(&self) -> Result<()> {
        match self.threshold {
            Some(threshold) if !threshold.is_finite() => Err(SearchError::Validation {
                field: "threshold".into(),
                message: format!("threshold must be a finite number, got {}", threshold),
            }),
            _ => Ok(()),
        }
    }
}

fn default_primary_key() -> String {
    TableSchema::DEFAULT_PRIMARY_KEY.to_string()
}

/// A searchable table as described in a JSON configuration file.
///
/// ```json
/// {
///   "table": "users",
///   "driver": "sqlite",
///   "columns": [{"column": "users.name", "weight": 10}],
///   "conditions": {"users.name": "[a-z]{3,}"}
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub driver: Dialect,
    #[serde(default)]
    pub table_prefix: String,
    /// Column listing used when `columns` is empty.
    #[serde(default)]
    pub table_columns: Option<Vec<String>>,
    #[serde(flatten)]
    pub spec: SearchSpec,
}

impl SearchConfig {
    /// Load and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SearchError::io_with_path(e, path))?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(SearchError::Validation {
                field: "table".into(),
                message: "table name must not be empty".into(),
            });
        }
        self.spec.validate()
    }

    /// Schema described by this file.
    pub fn schema(&self) -> TableSchema {
        let mut schema = TableSchema::new(self.driver, self.table.clone())
            .with_prefix(self.table_prefix.clone())
            .with_primary_key(self.primary_key.clone());
        schema.columns = self.table_columns.clone();
        schema
    }

    pub fn into_parts(self) -> (SearchSpec, TableSchema) {
        let schema = self.schema();
        (self.spec, schema)
    }
}
