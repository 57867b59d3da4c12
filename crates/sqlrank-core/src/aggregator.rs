//! Combines per-column terms into one relevance expression.

use crate::builder::BindValue;
use crate::config::ScoringConfig;
use crate::scorer::ColumnTerms;

/// Result of aggregating every column's terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Relevance {
    Scored(ScoredRelevance),
    /// No column admitted any word; the search must match nothing.
    NoOp,
}

/// A non-empty relevance sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRelevance {
    /// `t1 + t2 + ... + tN`, without the `max()` wrapper.
    pub sum: String,
    /// One value per term, in term order.
    pub bindings: Vec<BindValue>,
    /// Sum of the weights of contributing columns.
    pub total_weight: f64,
    pub term_count: usize,
}

impl ScoredRelevance {
    /// Aggregate expression, valid under GROUP BY.
    pub fn aggregate_expression(&self) -> String {
        format!("max({})", self.sum)
    }

    /// `max(...) as relevance`
    pub fn projection(&self) -> String {
        format!(
            "{} as {}",
            self.aggregate_expression(),
            ScoringConfig::RELEVANCE_ALIAS
        )
    }

    pub fn default_threshold(&self) -> f64 {
        self.total_weight / ScoringConfig::DEFAULT_THRESHOLD_DIVISOR
    }
}

/// Concatenate every term of every column, skipping empty columns.
pub fn aggregate(columns: Vec<ColumnTerms>) -> Relevance {
    let mut parts = Vec::new();
    let mut bindings = Vec::new();
    let mut total_weight = 0.0;

    for column in columns.into_iter().filter(|c| !c.is_empty()) {
        total_weight += column.weight;
        for term in column.terms {
            parts.push(term.sql);
            bindings.push(BindValue::Text(term.binding));
        }
    }

    if parts.is_empty() {
        return Relevance::NoOp;
    }

    Relevance::Scored(ScoredRelevance {
        sum: parts.join(" + "),
        term_count: parts.len(),
        bindings,
        total_weight,
    })
}
