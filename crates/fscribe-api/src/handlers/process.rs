//! Processing trigger and status handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fscribe_models::{PipelineStatus, UploadId};
use fscribe_worker::PipelineOptions;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Processing trigger request.
#[derive(Deserialize)]
pub struct ProcessRequest {
    pub upload_id: String,
    /// Recognized option: "ai_insights"
    #[serde(default)]
    pub processing_options: Vec<String>,
}

/// Processing trigger acknowledgement.
#[derive(Serialize)]
pub struct ProcessResponse {
    pub status: String,
    pub upload_id: String,
}

/// `POST /process`
///
/// Returns immediately with an acknowledgement; processing runs in the
/// background and is observed through the status endpoint and the
/// persisted result document. Only invalid input (unknown upload id,
/// out-of-range configuration) is rejected synchronously.
pub async fn start_processing(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> ApiResult<Json<ProcessResponse>> {
    let upload_id =
        UploadId::parse(request.upload_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let options = PipelineOptions::from_request(
        &request.processing_options,
        state.worker_config.frame_interval,
    );

    state.orchestrator.submit(upload_id.clone(), options).await?;

    Ok(Json(ProcessResponse {
        status: "processing_started".to_string(),
        upload_id: upload_id.to_string(),
    }))
}

/// `GET /process/:upload_id/status`
pub async fn processing_status(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> ApiResult<Json<PipelineStatus>> {
    let upload_id =
        UploadId::parse(upload_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    state
        .orchestrator
        .status(&upload_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No processing run for this upload"))
}

/// `POST /process/:upload_id/cancel`
pub async fn cancel_processing(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let upload_id =
        UploadId::parse(upload_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    if state.orchestrator.cancel(&upload_id).await {
        Ok(Json(json!({ "status": "cancelling", "upload_id": upload_id.to_string() })))
    } else {
        Err(ApiError::not_found("No in-flight pipeline for this upload"))
    }
}
