//! Filesystem layout convention.
//!
//! Chunks live under a chunks root keyed by upload id, assembled videos
//! under a videos root, result documents under a processed root. The
//! layout is a convention, not negotiable by callers.

use std::path::{Path, PathBuf};

use fscribe_models::UploadId;
use tokio::fs;

use crate::error::StorageResult;

/// Directory layout for all persisted artifacts.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Root for in-flight chunk files
    pub chunks_root: PathBuf,
    /// Root for assembled videos
    pub videos_root: PathBuf,
    /// Root for result documents
    pub processed_root: PathBuf,
    /// Root for extracted frame images
    pub frames_root: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::under("data")
    }
}

impl StorageLayout {
    /// Place all roots under one data directory.
    pub fn under(data_root: impl AsRef<Path>) -> Self {
        let root = data_root.as_ref();
        Self {
            chunks_root: root.join("chunks"),
            videos_root: root.join("videos"),
            processed_root: root.join("processed"),
            frames_root: root.join("frames"),
        }
    }

    /// Create layout from environment variables.
    pub fn from_env() -> Self {
        let data_root = std::env::var("DATA_ROOT").unwrap_or_else(|_| "data".to_string());
        Self::under(data_root)
    }

    /// Create every root directory.
    pub async fn ensure_dirs(&self) -> StorageResult<()> {
        for dir in [
            &self.chunks_root,
            &self.videos_root,
            &self.processed_root,
            &self.frames_root,
        ] {
            fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Directory holding one upload's chunks.
    pub fn chunk_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.chunks_root.join(upload_id.as_str())
    }

    /// Path of one chunk file. Zero-padded so directory listings sort
    /// readably; assembly orders numerically regardless.
    pub fn chunk_path(&self, upload_id: &UploadId, seq: u32) -> PathBuf {
        self.chunk_dir(upload_id).join(format!("chunk_{:04}", seq))
    }

    /// Path of the assembled video for one upload.
    pub fn video_path(&self, upload_id: &UploadId) -> PathBuf {
        self.videos_root.join(format!("{}.mp4", upload_id))
    }

    /// Directory holding one upload's extracted frames.
    pub fn frames_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.frames_root.join(upload_id.as_str())
    }

    /// Path of the result document derived from an assembled video's file name.
    pub fn result_path(&self, video_file: &str) -> PathBuf {
        self.processed_root.join(format!("{}_results.json", video_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = StorageLayout::under("/srv/fscribe");
        let id = UploadId::parse("u1").unwrap();

        assert_eq!(
            layout.chunk_path(&id, 7),
            PathBuf::from("/srv/fscribe/chunks/u1/chunk_0007")
        );
        assert_eq!(layout.video_path(&id), PathBuf::from("/srv/fscribe/videos/u1.mp4"));
        assert_eq!(
            layout.result_path("u1.mp4"),
            PathBuf::from("/srv/fscribe/processed/u1.mp4_results.json")
        );
    }
}
