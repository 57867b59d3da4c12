//! Per-column word admission.

use crate::error::Result;
use crate::spec::{CompiledRule, SearchSpec, WordPredicate};
use std::collections::HashMap;
use tracing::warn;

/// Compiled admission rules of one search call.
#[derive(Debug, Default)]
pub struct WordFilter {
    rules: HashMap<String, Vec<CompiledRule>>,
}

impl WordFilter {
    /// Compile every condition of `spec`.
    ///
    /// A malformed pattern fails the whole call, even when it belongs to a
    /// condition that names no scored column.
    pub fn compile(spec: &SearchSpec) -> Result<Self> {
        for column in spec.inert_conditions() {
            warn!("Admission rules for {} never apply: column is not searched", column);
        }

        let mut rules = HashMap::with_capacity(spec.conditions.len());
        for (column, configured) in &spec.conditions {
            let compiled = configured
                .iter()
                .map(|rule| rule.compile(column))
                .collect::<Result<Vec<_>>>()?;
            rules.insert(column.clone(), compiled);
        }
        Ok(Self { rules })
    }

    /// Words of `words` admitted to `column`, order preserved.
    pub fn admit<'a>(&self, column: &str, words: &'a [String]) -> Vec<&'a str> {
        filter_words(self.rules.get(column).map(Vec::as_slice), words)
    }
}

/// Keep the words accepted by at least one rule. No rules (or an empty rule
/// list) admits everything.
pub fn filter_words<'a>(rules: Option<&[CompiledRule]>, words: &'a [String]) -> Vec<&'a str> {
    match rules {
        Some(rules) if !rules.is_empty() => words
            .iter()
            .map(String::as_str)
            .filter(|word| rules.iter().any(|rule| rule.matches(word)))
            .collect(),
        _ => words.iter().map(String::as_str).collect(),
    }
}
