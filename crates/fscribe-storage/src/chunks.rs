//! Chunk persistence and ordered reassembly.
//!
//! Chunks may arrive out of order and concurrently. Each chunk file is
//! committed with a write-to-temp + atomic rename, so a partially written
//! chunk is never observable at its final path and re-sending a sequence
//! number overwrites instead of duplicating. Session bookkeeping lives
//! behind one async mutex; the completion check and the assembly claim
//! happen under that lock, so racing writers cannot double-trigger
//! assembly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use fscribe_models::{ChunkPut, SessionStatus, UploadId, UploadSession};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::layout::StorageLayout;

/// Persists uploaded byte chunks and reassembles completed uploads.
#[derive(Clone)]
pub struct ChunkStore {
    layout: StorageLayout,
    sessions: Arc<Mutex<HashMap<UploadId, UploadSession>>>,
}

impl ChunkStore {
    /// Create a new chunk store over the given layout.
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            layout,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store one chunk.
    ///
    /// Returns `ChunkPut::Partial` until every sequence number in
    /// `1..=total` has arrived; the completing chunk triggers assembly and
    /// returns `ChunkPut::Completed` with the assembled video's path.
    /// A write failure leaves the session in `Receiving`, so the caller may
    /// re-send the same chunk.
    pub async fn put_chunk(
        &self,
        upload_id: &UploadId,
        seq: u32,
        total: u32,
        bytes: &[u8],
    ) -> StorageResult<ChunkPut> {
        if total == 0 {
            return Err(StorageError::invalid_chunk("total_chunks must be at least 1"));
        }
        if seq == 0 || seq > total {
            return Err(StorageError::invalid_chunk(format!(
                "chunk_number {} outside 1..={}",
                seq, total
            )));
        }

        // Register the session (or validate against the existing one)
        // before touching the disk.
        {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .entry(upload_id.clone())
                .or_insert_with(|| UploadSession::new(upload_id.clone(), total));

            if session.expected_total != total {
                return Err(StorageError::invalid_chunk(format!(
                    "total_chunks {} conflicts with session total {}",
                    total, session.expected_total
                )));
            }

            // Re-sending into an already assembled upload is idempotent.
            if session.status == SessionStatus::Assembled {
                if let Some(path) = &session.video_path {
                    return Ok(ChunkPut::Completed {
                        video_path: path.clone(),
                    });
                }
            }
        }

        self.write_chunk_file(upload_id, seq, bytes).await?;

        // Record arrival and claim assembly if this chunk completed the set.
        // The check-and-claim happens under the session lock, so racing
        // writers of the final chunk cannot both start assembly.
        let claimed = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(upload_id)
                .ok_or_else(|| StorageError::unknown_upload(upload_id.as_str()))?;

            session.received.insert(seq);

            if session.is_complete() && session.status == SessionStatus::Receiving {
                session.status = SessionStatus::Complete;
            }

            if session.status == SessionStatus::Complete {
                session.status = SessionStatus::Assembling;
                true
            } else {
                false
            }
        };

        if !claimed {
            let sessions = self.sessions.lock().await;
            let session = sessions
                .get(upload_id)
                .ok_or_else(|| StorageError::unknown_upload(upload_id.as_str()))?;
            return Ok(ChunkPut::Partial {
                received: session.received_count(),
                total: session.expected_total,
            });
        }

        match self.assemble(upload_id, total).await {
            Ok(video_path) => {
                let mut sessions = self.sessions.lock().await;
                if let Some(session) = sessions.get_mut(upload_id) {
                    session.status = SessionStatus::Assembled;
                    session.video_path = Some(video_path.clone());
                }
                info!(upload_id = %upload_id, path = %video_path.display(), "Upload assembled");
                Ok(ChunkPut::Completed { video_path })
            }
            Err(e) => {
                // All chunks are still on disk; drop back to Complete so a
                // re-sent chunk retries assembly.
                let mut sessions = self.sessions.lock().await;
                if let Some(session) = sessions.get_mut(upload_id) {
                    session.status = SessionStatus::Complete;
                }
                warn!(upload_id = %upload_id, "Assembly failed: {}", e);
                Err(e)
            }
        }
    }

    /// Snapshot of one session's state.
    pub async fn session(&self, upload_id: &UploadId) -> Option<UploadSession> {
        self.sessions.lock().await.get(upload_id).cloned()
    }

    /// Locate the assembled video for an upload.
    ///
    /// Falls back to the on-disk layout so assembled uploads survive a
    /// process restart even though sessions are in-memory.
    pub async fn assembled_video(&self, upload_id: &UploadId) -> Option<PathBuf> {
        if let Some(session) = self.session(upload_id).await {
            if let Some(path) = session.video_path {
                return Some(path);
            }
        }

        let path = self.layout.video_path(upload_id);
        if fs::try_exists(&path).await.unwrap_or(false) {
            Some(path)
        } else {
            None
        }
    }

    /// Commit one chunk file with write-to-temp + atomic rename.
    async fn write_chunk_file(&self, upload_id: &UploadId, seq: u32, bytes: &[u8]) -> StorageResult<()> {
        let dir = self.layout.chunk_dir(upload_id);
        fs::create_dir_all(&dir).await?;

        let final_path = self.layout.chunk_path(upload_id, seq);
        // Unique temp name keeps concurrent re-sends of the same sequence
        // number from clobbering each other mid-write; the rename decides
        // the winner atomically.
        let tmp_path = dir.join(format!("chunk_{:04}.{}.tmp", seq, Uuid::new_v4().simple()));

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| StorageError::write_failed(format!("create {}: {}", tmp_path.display(), e)))?;
        if let Err(e) = file.write_all(bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::write_failed(format!(
                "write {}: {}",
                tmp_path.display(),
                e
            )));
        }
        if let Err(e) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::write_failed(format!(
                "sync {}: {}",
                tmp_path.display(),
                e
            )));
        }
        drop(file);

        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| StorageError::write_failed(format!("rename {}: {}", final_path.display(), e)))?;

        debug!(upload_id = %upload_id, seq, size = bytes.len(), "Chunk stored");
        Ok(())
    }

    /// Concatenate chunks in ascending numeric sequence order into the
    /// assembled video, then remove the chunk directory.
    async fn assemble(&self, upload_id: &UploadId, total: u32) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.layout.videos_root).await?;

        let video_path = self.layout.video_path(upload_id);
        let tmp_path = self
            .layout
            .videos_root
            .join(format!("{}.{}.tmp", upload_id, Uuid::new_v4().simple()));

        let mut out = fs::File::create(&tmp_path)
            .await
            .map_err(|e| StorageError::assembly_failed(format!("create {}: {}", tmp_path.display(), e)))?;

        for seq in 1..=total {
            let chunk_path = self.layout.chunk_path(upload_id, seq);
            let bytes = fs::read(&chunk_path).await.map_err(|e| {
                StorageError::assembly_failed(format!("read {}: {}", chunk_path.display(), e))
            })?;
            out.write_all(&bytes).await.map_err(|e| {
                StorageError::assembly_failed(format!("append chunk {}: {}", seq, e))
            })?;
        }

        out.sync_all()
            .await
            .map_err(|e| StorageError::assembly_failed(format!("sync assembled file: {}", e)))?;
        drop(out);

        fs::rename(&tmp_path, &video_path)
            .await
            .map_err(|e| StorageError::assembly_failed(format!("rename assembled file: {}", e)))?;

        // Chunk files are no longer needed once the assembled video exists.
        if let Err(e) = fs::remove_dir_all(self.layout.chunk_dir(upload_id)).await {
            warn!(upload_id = %upload_id, "Failed to remove chunk dir: {}", e);
        }

        Ok(video_path)
    }
}
