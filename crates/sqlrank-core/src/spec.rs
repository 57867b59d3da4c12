//! Declarative search configuration for one searchable table.

use crate::config::ScoringConfig;
use crate::error::{Result, SearchError};
use crate::scorer::format_number;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A column that takes part in scoring, with its base weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedColumn {
    /// Column identifier, usually qualified (`users.name`).
    pub column: String,
    /// Base weight; every match term multiplies it.
    pub weight: f64,
}

impl WeightedColumn {
    pub fn new(column: impl Into<String>, weight: f64) -> Self {
        Self {
            column: column.into(),
            weight,
        }
    }
}

/// Extra equality filter attached to a join's ON clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinFilter {
    pub column: String,
    pub value: String,
}

/// A left join performed before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Joined table (unprefixed).
    pub table: String,
    /// Left side of the ON equality.
    pub first: String,
    /// Right side of the ON equality.
    pub second: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<JoinFilter>,
}

impl JoinSpec {
    pub fn new(
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            first: first.into(),
            second: second.into(),
            filter: None,
        }
    }

    /// Add an extra `column = value` condition to the ON clause.
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(JoinFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }
}

/// Decides whether a query word may be searched in a column.
pub trait WordPredicate: Send + Sync {
    fn matches(&self, word: &str) -> bool;
}

impl<F> WordPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, word: &str) -> bool {
        self(word)
    }
}

/// Word-admission rule as configured.
#[derive(Clone)]
pub enum AdmissionRule {
    /// Regular expression that must match the whole word.
    Pattern(String),
    /// Arbitrary predicate supplied in code.
    Custom(Arc<dyn WordPredicate>),
}

impl AdmissionRule {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        AdmissionRule::Pattern(pattern.into())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        AdmissionRule::Custom(Arc::new(predicate))
    }

    /// Compile the rule into a matcher; patterns are anchored at both ends.
    pub fn compile(&self, column: &str) -> Result<CompiledRule> {
        match self {
            AdmissionRule::Pattern(pattern) => {
                let anchored = format!("^(?:{})$", pattern);
                let regex = Regex::new(&anchored).map_err(|source| SearchError::InvalidPattern {
                    column: column.to_string(),
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(CompiledRule::Pattern(regex))
            }
            AdmissionRule::Custom(predicate) => Ok(CompiledRule::Custom(Arc::clone(predicate))),
        }
    }
}

impl fmt::Debug for AdmissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionRule::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            AdmissionRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for AdmissionRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(AdmissionRule::Pattern)
    }
}

/// A compiled admission rule, ready to test words.
#[derive(Clone)]
pub enum CompiledRule {
    Pattern(Regex),
    Custom(Arc<dyn WordPredicate>),
}

impl WordPredicate for CompiledRule {
    fn matches(&self, word: &str) -> bool {
        match self {
            CompiledRule::Pattern(regex) => regex.is_match(word),
            CompiledRule::Custom(predicate) => predicate.matches(word),
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledRule::Pattern(regex) => {
                f.debug_tuple("Pattern").field(&regex.as_str()).finish()
            }
            CompiledRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One rule or a list of rules, as accepted in configuration files.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(AdmissionRule),
    Many(Vec<AdmissionRule>),
}

fn deserialize_conditions<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, Vec<AdmissionRule>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(column, rules)| match rules {
            OneOrMany::One(rule) => (column, vec![rule]),
            OneOrMany::Many(rules) => (column, rules),
        })
        .collect())
}

/// Search configuration of one table.
///
/// Read-only during a search; the same spec may be searched any number of
/// times.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSpec {
    /// Scored columns, in term-emission order. Empty means "every column of
    /// the table, weight 1".
    #[serde(default)]
    pub columns: Vec<WeightedColumn>,
    /// Per-column admission rules, OR-combined.
    #[serde(default, deserialize_with = "deserialize_conditions")]
    pub conditions: HashMap<String, Vec<AdmissionRule>>,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    /// Explicit GROUP BY list replacing the automatic one.
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
}

impl SearchSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: impl Into<String>, weight: f64) -> Self {
        self.columns.push(WeightedColumn::new(column, weight));
        self
    }

    /// Add an admission rule for a column; repeated calls OR the rules.
    pub fn condition(mut self, column: impl Into<String>, rule: AdmissionRule) -> Self {
        self.conditions.entry(column.into()).or_default().push(rule);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Check that every configured weight is a positive finite number large
    /// enough that its smallest term literal does not render as `0`.
    pub fn validate(&self) -> Result<()> {
        for column in &self.columns {
            if !(column.weight.is_finite() && column.weight > 0.0) {
                return Err(SearchError::Validation {
                    field: column.column.clone(),
                    message: format!("weight must be a positive number, got {}", column.weight),
                });
            }
            if format_number(column.weight * ScoringConfig::CONTAINS_MULTIPLIER) == "0" {
                return Err(SearchError::Validation {
                    field: column.column.clone(),
                    message: format!(
                        "weight {} is below the rendered precision of {} decimals",
                        column.weight,
                        ScoringConfig::LITERAL_PRECISION
                    ),
                });
            }
        }
        Ok(())
    }

    /// Condition keys that do not name a scored column. Such rules never
    /// apply. Empty when the scored columns come from the table listing.
    pub fn inert_conditions(&self) -> Vec<&str> {
        if self.columns.is_empty() {
            return Vec::new();
        }
        let mut inert: Vec<&str> = self
            .conditions
            .keys()
            .filter(|key| !self.columns.iter().any(|c| &c.column == *key))
            .map(String::as_str)
            .collect();
        inert.sort_unstable();
        inert
    }
}
