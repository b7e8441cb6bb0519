use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Manifest error: {0}")]
    Manifest(#[from] manifest_engine::ManifestError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
