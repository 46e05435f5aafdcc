//! Axum HTTP API for FrameScribe.
//!
//! Endpoints:
//! - `POST /upload/chunked` — store one upload chunk (multipart)
//! - `GET /upload/:upload_id/status` — upload session status
//! - `POST /process` — trigger background processing
//! - `GET /process/:upload_id/status` — pipeline status snapshot
//! - `POST /process/:upload_id/cancel` — cancel an in-flight pipeline
//! - `GET /health`, `GET /metrics`

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
