//! Frame sample and OCR text models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One frame sampled from an assembled video.
///
/// Samples form an ordered sequence: `index` is strictly increasing and
/// unique per upload, and `timestamp` is monotonic. A decode failure leaves
/// a gap in the indices rather than renumbering later frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSample {
    /// Position in the sampling schedule
    pub index: u32,
    /// Timestamp within the video, in seconds
    pub timestamp: f64,
    /// Path of the extracted frame image
    pub image_path: PathBuf,
}

/// Raw text recognized from one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    /// Frame index this text came from
    pub frame_index: u32,
    /// Path of the source frame image
    pub source: PathBuf,
    /// Recognized text; empty when OCR found nothing or failed
    pub text: String,
    /// Estimated token count of `text`
    pub token_count: usize,
}

impl TextUnit {
    /// An empty unit for a frame whose extraction failed or produced nothing.
    pub fn empty(frame_index: u32, source: PathBuf) -> Self {
        Self {
            frame_index,
            source,
            text: String::new(),
            token_count: 0,
        }
    }

    /// True when no text was recognized.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
