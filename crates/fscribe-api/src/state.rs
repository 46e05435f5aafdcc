//! Application state.

use std::sync::Arc;

use fscribe_enrich::{GeminiClient, InsightBackend};
use fscribe_storage::{ChunkStore, ResultStore, StorageLayout};
use fscribe_worker::{Orchestrator, PipelineContext, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub worker_config: WorkerConfig,
    pub chunks: ChunkStore,
    pub results: ResultStore,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state from the environment.
    ///
    /// A missing `GEMINI_API_KEY` fails here: the enrichment credential is
    /// a startup requirement, not a per-call error.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let layout = StorageLayout::from_env();
        layout.ensure_dirs().await?;

        let worker_config = WorkerConfig::from_env();
        let backend: Arc<dyn InsightBackend> = Arc::new(GeminiClient::from_env()?);
        let ctx = PipelineContext::production(worker_config.clone(), layout, backend)?;

        Ok(Self::with_context(config, worker_config, ctx))
    }

    /// Create state over a pre-built pipeline context (tests inject stub
    /// capabilities here).
    pub fn with_context(config: ApiConfig, worker_config: WorkerConfig, ctx: PipelineContext) -> Self {
        let chunks = ctx.chunks.clone();
        let results = ctx.results.clone();

        Self {
            config,
            worker_config,
            chunks,
            results,
            orchestrator: Arc::new(Orchestrator::new(ctx)),
        }
    }
}
