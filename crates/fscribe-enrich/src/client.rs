//! The enrichment client.
//!
//! Turns one `TextUnit` into one `EnrichedEntry`: the text is split into
//! token-budgeted segments, each segment is sent to the backend under the
//! retry policy, and permanent failures degrade to the sentinel insight.
//! Enrichment never errors past the entry boundary.

use std::num::NonZeroU32;
use std::sync::Arc;

use fscribe_models::{EnrichedEntry, Insight, TextUnit};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chunker::chunk_text;
use crate::error::{EnrichError, EnrichResult};
use crate::gemini::{strip_code_fence, InsightBackend};
use crate::retry::{retry_with_cancel, CancelFlag, RetryConfig, RetryOutcome};
use crate::token::TokenEstimator;

/// Enrichment configuration.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Token budget per segment sent to the backend.
    pub max_tokens_per_segment: usize,
    /// Retry policy for each per-segment call.
    pub retry: RetryConfig,
    /// Backend call throttle.
    pub requests_per_second: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_segment: 2000,
            retry: RetryConfig::new("enrich_segment"),
            requests_per_second: 2,
        }
    }
}

/// Fixed instruction template sent with every segment.
fn build_prompt(segment: &str) -> String {
    format!(
        r#"You are an advanced text analysis assistant. Analyze the text below and return ONLY a single JSON object with this schema:
{{
  "sentiment": "overall sentiment (e.g. positive, negative, neutral, mixed)",
  "keywords": ["up to 5 keywords, most important first"],
  "summary": "concise summary of the text, at most a few sentences",
  "complexity": "text complexity level (e.g. Easy, Standard, Difficult)"
}}

TEXT:
{segment}

Additional instructions:
- Return ONLY the JSON object and nothing else.
- keywords must contain at most 5 entries, ordered by importance.
"#
    )
}

/// Structured insight payload expected back from the backend.
#[derive(Debug, Deserialize)]
struct InsightPayload {
    sentiment: String,
    keywords: Vec<String>,
    summary: String,
    complexity: String,
}

fn parse_insight(raw: &str) -> EnrichResult<Insight> {
    let payload: InsightPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| EnrichError::MalformedInsight(e.to_string()))?;

    Ok(Insight {
        sentiment: payload.sentiment,
        keywords: payload.keywords,
        summary: payload.summary,
        complexity: payload.complexity,
    })
}

/// Sends deduplicated text units to the generative backend.
pub struct EnrichmentClient {
    backend: Arc<dyn InsightBackend>,
    estimator: TokenEstimator,
    config: EnrichmentConfig,
    limiter: DefaultDirectRateLimiter,
}

impl EnrichmentClient {
    /// Create a client over the given backend.
    pub fn new(backend: Arc<dyn InsightBackend>, config: EnrichmentConfig) -> EnrichResult<Self> {
        if config.max_tokens_per_segment == 0 {
            return Err(EnrichError::config("token budget must be positive"));
        }
        let rps = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| EnrichError::config("requests_per_second must be positive"))?;

        Ok(Self {
            backend,
            estimator: TokenEstimator::default(),
            config,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
        })
    }

    /// Enrich one text unit.
    ///
    /// Always returns an entry: a segment whose calls are exhausted gets
    /// the sentinel insight, and cancellation fills the remaining segments
    /// with sentinels without further backend calls.
    pub async fn enrich(&self, unit: &TextUnit, cancel: &CancelFlag) -> EnrichedEntry {
        let segments = chunk_text(&unit.text, self.config.max_tokens_per_segment, &self.estimator);
        debug!(
            frame = unit.frame_index,
            segments = segments.len(),
            "Enriching text unit"
        );

        let mut insights = Vec::with_capacity(segments.len());
        for segment in &segments {
            if cancel.is_cancelled() {
                insights.push(Insight::sentinel());
                continue;
            }
            insights.push(self.enrich_segment(segment, cancel).await);
        }

        EnrichedEntry {
            original_text: unit.text.clone(),
            frame_path: unit.source.clone(),
            total_tokens: self.estimator.estimate(&unit.text),
            insights,
        }
    }

    /// Call the backend for one segment, degrading to the sentinel on
    /// permanent failure.
    async fn enrich_segment(&self, segment: &str, cancel: &CancelFlag) -> Insight {
        // The backend is rate-limited and slow (seconds per segment);
        // waiting here keeps the whole worker pool inside the quota.
        self.limiter.until_ready().await;
        counter!("enrichment_segments_total").increment(1);

        let prompt = build_prompt(segment);
        let backend = self.backend.as_ref();
        let prompt_ref = prompt.as_str();
        let outcome = retry_with_cancel(&self.config.retry, cancel, move || async move {
            let raw = backend.generate(prompt_ref).await?;
            parse_insight(&raw)
        })
        .await;

        match outcome {
            RetryOutcome::Success(insight) => insight,
            RetryOutcome::Exhausted { error, attempts } => {
                warn!(
                    "Segment enrichment failed after {} attempts, substituting sentinel: {}",
                    attempts, error
                );
                counter!("enrichment_sentinels_total").increment(1);
                Insight::sentinel()
            }
            RetryOutcome::Cancelled => Insight::sentinel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::MockInsightBackend;
    use std::path::PathBuf;
    use std::time::Duration;

    fn unit(text: &str) -> TextUnit {
        TextUnit {
            frame_index: 0,
            source: PathBuf::from("frames/frame_0000.jpg"),
            text: text.to_string(),
            token_count: 0,
        }
    }

    fn fast_config(max_tokens: usize) -> EnrichmentConfig {
        EnrichmentConfig {
            max_tokens_per_segment: max_tokens,
            retry: RetryConfig::new("test").with_base_delay(Duration::from_millis(1)),
            requests_per_second: 1000,
        }
    }

    fn valid_payload() -> String {
        serde_json::json!({
            "sentiment": "positive",
            "keywords": ["rust", "video"],
            "summary": "A short lecture caption.",
            "complexity": "Standard"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_always_failing_backend_yields_all_sentinels() {
        let mut backend = MockInsightBackend::new();
        backend
            .expect_generate()
            .returning(|_| Err(EnrichError::backend(500, "down")));

        let client = EnrichmentClient::new(Arc::new(backend), fast_config(5)).unwrap();
        let entry = client
            .enrich(&unit("many words that will split into several segments here"), &CancelFlag::new())
            .await;

        assert!(!entry.insights.is_empty());
        assert!(entry.insights.iter().all(|i| i.is_sentinel()));
    }

    #[tokio::test]
    async fn test_one_malformed_segment_does_not_poison_siblings() {
        // Budget of 2 tokens forces one segment per word.
        let mut backend = MockInsightBackend::new();
        backend.expect_generate().returning(|prompt| {
            if prompt.contains("badword") {
                Ok("this is not json".to_string())
            } else {
                Ok(valid_payload())
            }
        });

        let client = EnrichmentClient::new(Arc::new(backend), fast_config(2)).unwrap();
        let entry = client.enrich(&unit("goodone badword another"), &CancelFlag::new()).await;

        assert_eq!(entry.insights.len(), 3);
        assert!(!entry.insights[0].is_sentinel());
        assert!(entry.insights[1].is_sentinel());
        assert!(!entry.insights[2].is_sentinel());
    }

    #[tokio::test]
    async fn test_insights_match_segment_count_and_order() {
        let mut backend = MockInsightBackend::new();
        backend.expect_generate().returning(|_| Ok(valid_payload()));

        let client = EnrichmentClient::new(Arc::new(backend), fast_config(3)).unwrap();
        let text = "alpha beta gamma delta epsilon zeta";
        let entry = client.enrich(&unit(text), &CancelFlag::new()).await;

        let expected = chunk_text(text, 3, &TokenEstimator::default()).len();
        assert_eq!(entry.insights.len(), expected);
        assert_eq!(entry.original_text, text);
        assert!(entry.total_tokens > 0);
    }

    #[tokio::test]
    async fn test_empty_text_yields_empty_insights() {
        let backend = MockInsightBackend::new();
        let client = EnrichmentClient::new(Arc::new(backend), fast_config(2000)).unwrap();

        let entry = client.enrich(&unit(""), &CancelFlag::new()).await;
        assert!(entry.insights.is_empty());
        assert_eq!(entry.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_cancellation_skips_backend_calls() {
        let mut backend = MockInsightBackend::new();
        backend.expect_generate().times(0);

        let client = EnrichmentClient::new(Arc::new(backend), fast_config(2)).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let entry = client.enrich(&unit("one two three"), &cancel).await;
        assert!(entry.insights.iter().all(|i| i.is_sentinel()));
    }

    #[tokio::test]
    async fn test_malformed_then_valid_recovers_within_retries() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let mut backend = MockInsightBackend::new();
        backend.expect_generate().returning(move |_| {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                Ok("```json\ngarbage".to_string())
            } else {
                Ok(valid_payload())
            }
        });

        let client = EnrichmentClient::new(Arc::new(backend), fast_config(2000)).unwrap();
        let entry = client.enrich(&unit("short caption"), &CancelFlag::new()).await;

        assert_eq!(entry.insights.len(), 1);
        assert!(!entry.insights[0].is_sentinel());
        assert_eq!(entry.insights[0].sentiment, "positive");
    }

    #[test]
    fn test_zero_budget_rejected() {
        let backend = MockInsightBackend::new();
        let config = EnrichmentConfig {
            max_tokens_per_segment: 0,
            ..fast_config(1)
        };
        assert!(EnrichmentClient::new(Arc::new(backend), config).is_err());
    }
}
