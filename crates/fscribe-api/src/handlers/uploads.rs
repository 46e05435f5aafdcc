//! Chunked upload handlers.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use metrics::counter;
use serde::Serialize;
use tracing::info;

use fscribe_models::{ChunkPut, UploadId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for one stored chunk.
#[derive(Serialize)]
pub struct ChunkUploadResponse {
    pub upload_id: String,
    /// "partial" until every chunk arrived, then "completed"
    pub status: String,
    pub total_chunks_expected: u32,
}

/// Upload session status response.
#[derive(Serialize)]
pub struct UploadStatusResponse {
    pub upload_id: String,
    pub status: String,
    pub chunks_uploaded: u32,
    pub total_chunks_expected: u32,
}

/// Fields parsed out of the multipart form.
#[derive(Default)]
struct ChunkForm {
    bytes: Option<Vec<u8>>,
    chunk_number: Option<u32>,
    total_chunks: Option<u32>,
    upload_id: Option<String>,
}

/// `POST /upload/chunked`
///
/// Accepts one chunk as a multipart form: `file` bytes, `chunk_number`
/// (1-based), `total_chunks`, and an optional `upload_id` (generated when
/// absent). Re-posting the same chunk number is idempotent.
pub async fn upload_chunk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ChunkUploadResponse>> {
    let mut form = ChunkForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read chunk bytes: {}", e)))?;
                form.bytes = Some(bytes.to_vec());
            }
            "chunk_number" => form.chunk_number = Some(parse_field(&name, field).await?),
            "total_chunks" => form.total_chunks = Some(parse_field(&name, field).await?),
            "upload_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid upload_id field: {}", e)))?;
                if !text.is_empty() {
                    form.upload_id = Some(text);
                }
            }
            _ => {}
        }
    }

    let bytes = form
        .bytes
        .ok_or_else(|| ApiError::bad_request("Missing file field"))?;
    let chunk_number = form
        .chunk_number
        .ok_or_else(|| ApiError::bad_request("Missing chunk_number field"))?;
    let total_chunks = form
        .total_chunks
        .ok_or_else(|| ApiError::bad_request("Missing total_chunks field"))?;

    let upload_id = match form.upload_id {
        Some(id) => UploadId::parse(id).map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => UploadId::new(),
    };

    let put = state
        .chunks
        .put_chunk(&upload_id, chunk_number, total_chunks, &bytes)
        .await?;
    counter!("chunks_received_total").increment(1);

    let status = match &put {
        ChunkPut::Partial { .. } => "partial",
        ChunkPut::Completed { .. } => "completed",
    };
    if put.is_completed() {
        info!(upload_id = %upload_id, "Upload completed and assembled");
    }

    Ok(Json(ChunkUploadResponse {
        upload_id: upload_id.to_string(),
        status: status.to_string(),
        total_chunks_expected: total_chunks,
    }))
}

/// `GET /upload/:upload_id/status`
pub async fn upload_status(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> ApiResult<Json<UploadStatusResponse>> {
    let upload_id =
        UploadId::parse(upload_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let session = state
        .chunks
        .session(&upload_id)
        .await
        .ok_or_else(|| ApiError::not_found("No upload found with this ID"))?;

    Ok(Json(UploadStatusResponse {
        upload_id: upload_id.to_string(),
        status: session.status.to_string(),
        chunks_uploaded: session.received_count(),
        total_chunks_expected: session.expected_total,
    }))
}

async fn parse_field(name: &str, field: axum::extract::multipart::Field<'_>) -> ApiResult<u32> {
    let text = field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid {} field: {}", name, e)))?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{} must be a positive integer", name)))
}
