//! Token cost estimation.
//!
//! The target model's real tokenizer is not available here, so the
//! estimator uses the common ~4-characters-per-token approximation. It is
//! deliberately kept behind this type so a real tokenizer can replace it
//! without touching the chunker.

/// Estimates the token cost of text for the target language model.
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    chars_per_token: usize,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

impl TokenEstimator {
    /// Create an estimator with a custom character-per-token ratio.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    /// Estimate the token count of `text`.
    ///
    /// Whitespace-only text costs nothing; any other text costs at least
    /// one token.
    pub fn estimate(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        self.estimate_for_len(text.chars().count())
    }

    /// Estimate the token count of a string of `char_count` characters.
    ///
    /// Used by the chunker to track a growing segment without re-walking
    /// the accumulated text; consistent with [`estimate`](Self::estimate)
    /// by construction.
    pub fn estimate_for_len(&self, char_count: usize) -> usize {
        char_count.div_ceil(self.chars_per_token).max(1)
    }
}
