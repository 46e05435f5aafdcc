//! Text enrichment for FrameScribe.
//!
//! This crate provides:
//! - `TokenEstimator` and the token-budgeted `chunk_text` splitter
//! - `Deduplicator` for consecutive near-duplicate captions
//! - `RetryConfig`/`retry_with_cancel` for resilient external calls
//! - `GeminiClient` implementing the `InsightBackend` capability
//! - `EnrichmentClient` turning text units into enriched entries

pub mod chunker;
pub mod client;
pub mod dedup;
pub mod error;
pub mod gemini;
pub mod retry;
pub mod token;

pub use chunker::chunk_text;
pub use client::{EnrichmentClient, EnrichmentConfig};
pub use dedup::{DedupPolicy, Deduplicator};
pub use error::{EnrichError, EnrichResult};
pub use gemini::{GeminiClient, InsightBackend};
pub use retry::{retry_with_cancel, CancelFlag, RetryConfig, RetryOutcome};
pub use token::TokenEstimator;
