//! Result document persistence.

use std::path::PathBuf;

use fscribe_models::ResultDocument;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::layout::StorageLayout;

/// Persists one JSON result document per upload.
///
/// Documents are named deterministically from the assembled video's file
/// name and fully overwritten on reprocessing.
#[derive(Clone)]
pub struct ResultStore {
    layout: StorageLayout,
}

impl ResultStore {
    /// Create a new result store over the given layout.
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Write a result document, replacing any previous one for the same video.
    pub async fn write(&self, doc: &ResultDocument) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.layout.processed_root).await?;

        let path = self.layout.result_path(&doc.video_file);
        let tmp = self
            .layout
            .processed_root
            .join(format!(".{}.{}.tmp", doc.video_file, Uuid::new_v4().simple()));

        let json = serde_json::to_vec_pretty(doc)?;
        fs::write(&tmp, &json)
            .await
            .map_err(|e| StorageError::ResultWriteFailed(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StorageError::ResultWriteFailed(format!("rename {}: {}", path.display(), e)))?;

        info!(video_file = %doc.video_file, path = %path.display(), "Result document written");
        Ok(path)
    }

    /// Read the result document for an assembled video, if present.
    pub async fn read(&self, video_file: &str) -> StorageResult<Option<ResultDocument>> {
        let path = self.layout.result_path(video_file);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
