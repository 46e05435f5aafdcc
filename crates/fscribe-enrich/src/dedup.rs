//! Consecutive near-duplicate removal.
//!
//! Static video segments (a slide held for a minute) OCR into the same
//! caption dozens of times; dropping consecutive duplicates bounds the
//! number of backend calls. Each unit's normalized text is compared
//! against the previously *kept* unit only, so order is preserved and the
//! pass is idempotent.

use std::collections::HashSet;

use fscribe_models::TextUnit;
use tracing::debug;

/// How aggressively consecutive units are considered duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupPolicy {
    /// Drop only exact matches of the normalized text.
    Exact,
    /// Additionally drop units whose normalized word sets overlap at or
    /// above this Jaccard threshold (0.0..=1.0).
    Overlap { threshold: f64 },
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self::Exact
    }
}

/// Removes near-duplicate consecutive text units.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    policy: DedupPolicy,
}

impl Deduplicator {
    /// Create a deduplicator with the given policy.
    pub fn new(policy: DedupPolicy) -> Self {
        Self { policy }
    }

    /// Drop each unit whose normalized text duplicates the prior kept unit.
    pub fn deduplicate(&self, units: Vec<TextUnit>) -> Vec<TextUnit> {
        let mut kept: Vec<TextUnit> = Vec::with_capacity(units.len());
        let mut last_normalized: Option<String> = None;

        for unit in units {
            let normalized = normalize(&unit.text);
            let duplicate = match &last_normalized {
                Some(prev) => self.is_duplicate(prev, &normalized),
                None => false,
            };

            if duplicate {
                debug!(frame = unit.frame_index, "Dropping duplicate caption");
                continue;
            }

            last_normalized = Some(normalized);
            kept.push(unit);
        }

        kept
    }

    fn is_duplicate(&self, prev: &str, current: &str) -> bool {
        if prev == current {
            return true;
        }
        match self.policy {
            DedupPolicy::Exact => false,
            DedupPolicy::Overlap { threshold } => jaccard(prev, current) >= threshold,
        }
    }
}

/// Normalize text for comparison: lowercase, strip special characters,
/// collapse whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard similarity of two normalized texts' word sets.
fn jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}
