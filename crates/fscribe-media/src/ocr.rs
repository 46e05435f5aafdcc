//! OCR delegation.
//!
//! Character recognition is an external capability; the default
//! implementation shells out to the `tesseract` CLI. A per-frame
//! recognition failure yields an empty text unit, never an error.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use fscribe_models::{FrameSample, TextUnit};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Recognizes text in a single image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &Path) -> MediaResult<String>;
}

/// Production recognizer shelling out to Tesseract.
pub struct TesseractRecognizer {
    lang: String,
}

impl TesseractRecognizer {
    /// Create a recognizer, verifying the `tesseract` binary is available.
    pub fn new(lang: impl Into<String>) -> MediaResult<Self> {
        which::which("tesseract").map_err(|_| MediaError::TesseractNotFound)?;
        Ok(Self { lang: lang.into() })
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &Path) -> MediaResult<String> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.lang])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ocr_failed(format!(
                "tesseract exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Extracts text from frame samples via a recognizer.
pub struct TextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
}

impl TextExtractor {
    /// Create an extractor over the given recognizer.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Extract text from one frame.
    ///
    /// A recognition failure is logged and produces an empty unit; the
    /// caller derives token counts afterwards.
    pub async fn extract(&self, sample: &FrameSample) -> TextUnit {
        match self.recognizer.recognize(&sample.image_path).await {
            Ok(text) => {
                debug!(frame = sample.index, chars = text.len(), "Frame text extracted");
                TextUnit {
                    frame_index: sample.index,
                    source: sample.image_path.clone(),
                    text,
                    token_count: 0,
                }
            }
            Err(e) => {
                warn!(frame = sample.index, "OCR failed, yielding empty text: {}", e);
                TextUnit::empty(sample.index, sample.image_path.clone())
            }
        }
    }
}
