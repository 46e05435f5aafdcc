//! Upload processing pipeline.
//!
//! This crate provides:
//! - The per-upload pipeline (assemble → extract → deduplicate → enrich)
//! - A cancellable orchestrator with a bounded worker pool
//! - An in-memory status registry for progress polling
//! - Structured per-upload logging

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::{Orchestrator, StatusRegistry};
pub use pipeline::{PipelineContext, PipelineOptions};
