//! Weighted match terms for a single column.
//!
//! Every term binds exactly one value, so a term list is also its own
//! binding sequence: reading `binding` off the terms in order yields the
//! placeholders in the order they appear in the SQL.

use crate::config::ScoringConfig;
use crate::dialect::Dialect;

/// Strength of a match, from whole-word equality down to substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    Exact,
    Prefix,
    Suffix,
    Contains,
    WholeTextExact,
    WholeTextContains,
}

impl MatchTier {
    /// Per-word tiers, in emission order.
    pub const WORD_TIERS: [MatchTier; 4] = [
        MatchTier::Exact,
        MatchTier::Prefix,
        MatchTier::Suffix,
        MatchTier::Contains,
    ];

    /// Whole-query tiers, in emission order.
    pub const WHOLE_TEXT_TIERS: [MatchTier; 2] =
        [MatchTier::WholeTextExact, MatchTier::WholeTextContains];

    pub fn multiplier(&self) -> f64 {
        match self {
            MatchTier::Exact => ScoringConfig::EXACT_MULTIPLIER,
            MatchTier::Prefix => ScoringConfig::PREFIX_MULTIPLIER,
            MatchTier::Suffix => ScoringConfig::SUFFIX_MULTIPLIER,
            MatchTier::Contains => ScoringConfig::CONTAINS_MULTIPLIER,
            MatchTier::WholeTextExact => ScoringConfig::WHOLE_TEXT_EXACT_MULTIPLIER,
            MatchTier::WholeTextContains => ScoringConfig::WHOLE_TEXT_CONTAINS_MULTIPLIER,
        }
    }

    /// `(before, after)` wildcards wrapped around the bound word.
    pub fn wildcards(&self) -> (&'static str, &'static str) {
        match self {
            MatchTier::Exact | MatchTier::WholeTextExact => ("", ""),
            MatchTier::Prefix => ("", "%"),
            MatchTier::Suffix => ("%", ""),
            MatchTier::Contains | MatchTier::WholeTextContains => ("%", "%"),
        }
    }

    /// LIKE pattern bound for `word`.
    pub fn pattern(&self, word: &str) -> String {
        let (before, after) = self.wildcards();
        format!("{}{}{}", before, word, after)
    }
}

/// One `(case when ... then n else 0 end)` term and the value it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchTerm {
    pub sql: String,
    pub binding: String,
    pub contribution: f64,
}

/// All terms produced for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTerms {
    pub column: String,
    pub weight: f64,
    pub terms: Vec<MatchTerm>,
}

impl ColumnTerms {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Render a numeric literal in its shortest stable form (`60`, `7.5`).
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.*}", ScoringConfig::LITERAL_PRECISION, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build one term per word for a single tier.
pub fn score(
    dialect: Dialect,
    column: &str,
    weight: f64,
    words: &[&str],
    tier: MatchTier,
) -> Vec<MatchTerm> {
    let contribution = weight * tier.multiplier();
    let sql = format!(
        "(case when LOWER({}) {} ? then {} else 0 end)",
        dialect.quote_identifier(column),
        dialect.like_operator(),
        format_number(contribution)
    );

    words
        .iter()
        .map(|word| MatchTerm {
            sql: sql.clone(),
            binding: tier.pattern(word),
            contribution,
        })
        .collect()
}

/// Build every term of a column: the four word tiers (unless suppressed)
/// followed by the whole-text tiers when `whole_text` is given.
pub fn score_column(
    dialect: Dialect,
    column: &str,
    weight: f64,
    words: &[&str],
    include_word_tiers: bool,
    whole_text: Option<&str>,
) -> ColumnTerms {
    let mut terms = Vec::new();

    if include_word_tiers {
        for tier in MatchTier::WORD_TIERS {
            terms.extend(score(dialect, column, weight, words, tier));
        }
    }

    if let Some(text) = whole_text {
        for tier in MatchTier::WHOLE_TEXT_TIERS {
            terms.extend(score(dialect, column, weight, &[text], tier));
        }
    }

    ColumnTerms {
        column: column.to_string(),
        weight,
        terms,
    }
}
