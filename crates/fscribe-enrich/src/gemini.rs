//! Gemini client for insight generation.
//!
//! Implements the `InsightBackend` capability over Google's
//! `generateContent` API. The API key is a startup requirement: a missing
//! credential fails construction, never an individual call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EnrichError, EnrichResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one prompt to a generative backend and returns its raw text reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> EnrichResult<String>;
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client from the environment.
    ///
    /// Reads `GEMINI_API_KEY` (required) and `GEMINI_MODEL` (optional).
    pub fn from_env() -> EnrichResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| EnrichError::MissingApiKey)?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    /// Create a client with explicit credentials.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> EnrichResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(EnrichError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(EnrichError::Request)?;

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Override the API base URL (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl InsightBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> EnrichResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::backend(status, body));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(EnrichError::Request)?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or(EnrichError::EmptyResponse)?;

        Ok(text.to_string())
    }
}

/// Strip an optional markdown code fence around a JSON payload.
///
/// Models wrap JSON in ```json fences often enough that tolerating them is
/// cheaper than retrying.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
