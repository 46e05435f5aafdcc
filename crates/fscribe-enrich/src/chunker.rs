//! Token-budgeted text chunking.
//!
//! Greedy word accumulation: walk the text word by word and close the
//! current segment when adding the next word would push its estimated
//! token count past the budget. Pure and deterministic; no state across
//! calls.
//!
//! A single word whose own estimate exceeds the budget is emitted as a
//! segment by itself rather than being dropped; that is the one case where
//! a segment may exceed the budget.

use crate::token::TokenEstimator;

/// Split `text` into segments, each estimated at `max_tokens` or fewer.
///
/// Segment order preserves word order, and the concatenation of all
/// segments' words reproduces the input word sequence exactly (interior
/// whitespace is normalized to single spaces).
pub fn chunk_text(text: &str, max_tokens: usize, estimator: &TokenEstimator) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    // Character length of the current segment as it would be joined,
    // tracked incrementally so each word costs O(word) not O(segment).
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        let candidate_chars = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };

        if !current.is_empty() && estimator.estimate_for_len(candidate_chars) > max_tokens {
            segments.push(current.join(" "));
            current.clear();
            current_chars = word_chars;
        } else {
            current_chars = candidate_chars;
        }
        current.push(word);
    }

    if !current.is_empty() {
        segments.push(current.join(" "));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(segments: &[String]) -> Vec<&str> {
        segments.iter().flat_map(|s| s.split_whitespace()).collect()
    }

    #[test]
    fn test_empty_text_yields_no_segments() {
        let estimator = TokenEstimator::default();
        assert!(chunk_text("", 10, &estimator).is_empty());
        assert!(chunk_text("  \n ", 10, &estimator).is_empty());
    }

    #[test]
    fn test_short_text_is_one_segment() {
        let estimator = TokenEstimator::default();
        let segments = chunk_text("hello world", 100, &estimator);
        assert_eq!(segments, vec!["hello world"]);
    }

    #[test]
    fn test_every_segment_within_budget() {
        let estimator = TokenEstimator::default();
        let text = "the quick brown fox jumps over the lazy dog and keeps running far away";
        for budget in 1..20 {
            for segment in chunk_text(text, budget, &estimator) {
                let fits = estimator.estimate(&segment) <= budget;
                let single_oversized_word = !segment.contains(' ');
                assert!(
                    fits || single_oversized_word,
                    "segment {:?} over budget {}",
                    segment,
                    budget
                );
            }
        }
    }

    #[test]
    fn test_split_is_lossless() {
        let estimator = TokenEstimator::default();
        // 50 words, small budget: multiple segments reconstruct the input
        let text = (0..50).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        let segments = chunk_text(&text, 10, &estimator);

        assert!(segments.len() > 1);
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(words(&segments), original);
    }

    #[test]
    fn test_oversized_word_is_emitted_alone() {
        let estimator = TokenEstimator::default();
        let text = "tiny pneumonoultramicroscopicsilicovolcanoconiosis tiny";
        let segments = chunk_text(text, 2, &estimator);

        // The giant word exceeds the budget on its own but is not dropped
        assert!(segments.iter().any(|s| s.contains("pneumono")));
        assert_eq!(words(&segments), vec!["tiny", "pneumonoultramicroscopicsilicovolcanoconiosis", "tiny"]);
        let giant = segments.iter().find(|s| s.contains("pneumono")).unwrap();
        assert!(!giant.contains(' '), "oversized word must stand alone");
    }

    #[test]
    fn test_deterministic() {
        let estimator = TokenEstimator::default();
        let text = "captions repeat across frames in a long lecture recording";
        assert_eq!(chunk_text(text, 5, &estimator), chunk_text(text, 5, &estimator));
    }
}
