//! Error type shared by the benchmark components

use thiserror::Error;

/// Errors that stop a benchmark from running.
///
/// Sensor failures never show up here: the thermal sampler treats an
/// unreadable source as unavailable and moves on.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("Failed to create GPU device: {0}")]
    Device(String),

    #[error("Could not compile {stage} shader:\n{diagnostics}")]
    Shader { stage: &'static str, diagnostics: String },

    #[error("Render thread failure: {0}")]
    RenderThread(String),
}
