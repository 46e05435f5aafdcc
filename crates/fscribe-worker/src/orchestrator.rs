//! Pipeline orchestration.
//!
//! Submission returns immediately with an acknowledgement; the pipeline
//! runs as a background task gated by a semaphore so concurrent uploads
//! stay bounded. Completion is observed by polling the status registry;
//! failures persist an error record instead of a result and never take
//! the pool down with them.

use std::collections::HashMap;
use std::sync::Arc;

use fscribe_enrich::CancelFlag;
use fscribe_models::{PipelineStatus, ResultDocument, UploadId};
use metrics::counter;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{run_pipeline, PipelineContext, PipelineOptions};

/// In-memory registry of per-upload pipeline status snapshots.
#[derive(Clone, Default)]
pub struct StatusRegistry {
    inner: Arc<Mutex<HashMap<UploadId, PipelineStatus>>>,
}

impl StatusRegistry {
    /// Insert a fresh status for a newly submitted upload, replacing any
    /// previous run's snapshot.
    pub async fn start(&self, upload_id: &UploadId) {
        self.inner
            .lock()
            .await
            .insert(upload_id.clone(), PipelineStatus::new(upload_id.clone()));
    }

    /// Snapshot of one upload's status.
    pub async fn get(&self, upload_id: &UploadId) -> Option<PipelineStatus> {
        self.inner.lock().await.get(upload_id).cloned()
    }

    /// Apply a mutation to one upload's status.
    pub async fn update<F>(&self, upload_id: &UploadId, f: F)
    where
        F: FnOnce(&mut PipelineStatus),
    {
        if let Some(status) = self.inner.lock().await.get_mut(upload_id) {
            f(status);
        }
    }
}

/// Runs upload pipelines as cancellable background jobs.
pub struct Orchestrator {
    ctx: Arc<PipelineContext>,
    semaphore: Arc<Semaphore>,
    jobs: Arc<Mutex<HashMap<UploadId, CancelFlag>>>,
    statuses: StatusRegistry,
}

impl Orchestrator {
    /// Create an orchestrator over a pipeline context.
    pub fn new(ctx: PipelineContext) -> Self {
        let semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_pipelines));
        Self {
            ctx: Arc::new(ctx),
            semaphore,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            statuses: StatusRegistry::default(),
        }
    }

    /// The registry this orchestrator writes status snapshots into.
    pub fn status_registry(&self) -> StatusRegistry {
        self.statuses.clone()
    }

    /// Submit an upload for background processing.
    ///
    /// Invalid input (unknown upload, out-of-range interval, already
    /// running) is rejected here synchronously; once this returns `Ok`,
    /// any later failure surfaces through the status registry and the
    /// persisted error record only.
    pub async fn submit(&self, upload_id: UploadId, options: PipelineOptions) -> PipelineResult<()> {
        if options.frame_interval < self.ctx.config.min_frame_interval
            || options.frame_interval > self.ctx.config.max_frame_interval
        {
            return Err(PipelineError::invalid_configuration(format!(
                "frame interval {}s outside {}s..={}s",
                options.frame_interval,
                self.ctx.config.min_frame_interval,
                self.ctx.config.max_frame_interval
            )));
        }

        if self.ctx.chunks.assembled_video(&upload_id).await.is_none() {
            return Err(PipelineError::missing_video(upload_id.as_str()));
        }

        let cancel = CancelFlag::new();
        {
            let mut jobs = self.jobs.lock().await;
            if jobs.contains_key(&upload_id) {
                return Err(PipelineError::AlreadyProcessing(upload_id.to_string()));
            }
            jobs.insert(upload_id.clone(), cancel.clone());
        }

        self.statuses.start(&upload_id).await;
        info!(upload_id = %upload_id, "Pipeline submitted");

        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.semaphore);
        let jobs = Arc::clone(&self.jobs);
        let statuses = self.statuses.clone();

        tokio::spawn(async move {
            // Queue behind the worker pool; a cancel while queued is
            // honored by the pipeline's first check.
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    jobs.lock().await.remove(&upload_id);
                    return;
                }
            };
            let _permit = permit;

            let result = run_pipeline(&ctx, &upload_id, &options, &cancel, &statuses).await;
            Self::finish(&ctx, &statuses, &upload_id, result).await;

            jobs.lock().await.remove(&upload_id);
        });

        Ok(())
    }

    /// Record the terminal outcome of one pipeline run.
    async fn finish(
        ctx: &PipelineContext,
        statuses: &StatusRegistry,
        upload_id: &UploadId,
        result: PipelineResult<()>,
    ) {
        match result {
            Ok(()) => {
                counter!("pipelines_completed_total").increment(1);
            }
            Err(e) => {
                if e.is_cancelled() {
                    warn!(upload_id = %upload_id, "Pipeline cancelled");
                } else {
                    error!(upload_id = %upload_id, "Pipeline failed: {}", e);
                }
                counter!("pipelines_failed_total").increment(1);
                statuses.update(upload_id, |s| s.fail(e.to_string())).await;

                // Persist the error record so the failure is observable
                // after the status registry is gone.
                let video_file = format!("{}.mp4", upload_id);
                let doc = ResultDocument::failed(upload_id.clone(), video_file, e.to_string());
                if let Err(write_err) = ctx.results.write(&doc).await {
                    error!(upload_id = %upload_id, "Failed to persist error record: {}", write_err);
                }
            }
        }
    }

    /// Snapshot of one upload's pipeline status.
    pub async fn status(&self, upload_id: &UploadId) -> Option<PipelineStatus> {
        self.statuses.get(upload_id).await
    }

    /// Request cancellation of an in-flight pipeline.
    ///
    /// Returns false when no pipeline is running for the upload.
    pub async fn cancel(&self, upload_id: &UploadId) -> bool {
        let jobs = self.jobs.lock().await;
        match jobs.get(upload_id) {
            Some(flag) => {
                flag.cancel();
                info!(upload_id = %upload_id, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Cancel every in-flight pipeline (graceful shutdown).
    pub async fn shutdown(&self) {
        let jobs = self.jobs.lock().await;
        for (upload_id, flag) in jobs.iter() {
            flag.cancel();
            info!(upload_id = %upload_id, "Cancelled for shutdown");
        }
    }
}
