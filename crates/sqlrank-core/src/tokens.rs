//! Query normalization.

/// A search string split into scoring units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    /// Trimmed, lower-cased query; used for whole-text matching.
    pub text: String,
    /// Whitespace-separated words of `text`. Duplicates are kept.
    pub words: Vec<String>,
}

impl SearchTerms {
    /// Normalize a raw query. Returns `None` for blank input.
    pub fn parse(query: &str) -> Option<Self> {
        let text = query.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        let words = text.split_whitespace().map(str::to_string).collect();
        Some(Self { text, words })
    }

    /// Whether whole-text terms are emitted for these options.
    pub fn wants_whole_text(&self, match_whole_text: bool, match_whole_text_only: bool) -> bool {
        match_whole_text_only || (match_whole_text && self.words.len() > 1)
    }
}
