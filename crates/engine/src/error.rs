use std::sync::Arc;

use hls::HlsError;

/// Errors returned by manifest parsing
#[derive(Debug, thiserror::Error, Clone)]
pub enum ManifestError {
    #[error("HLS error: {0}")]
    Hls(#[from] HlsError),
    #[error("Network error: {source}")]
    Network { source: Arc<reqwest::Error> },
    #[error("HTTP {status} for {uri}")]
    HttpStatus { uri: String, status: u16 },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

// Manual implementation of From<reqwest::Error> for ManifestError
// because of the Arc wrapping.
impl From<reqwest::Error> for ManifestError {
    fn from(err: reqwest::Error) -> Self {
        ManifestError::Network {
            source: Arc::new(err),
        }
    }
}

impl From<url::ParseError> for ManifestError {
    fn from(err: url::ParseError) -> Self {
        ManifestError::InvalidUri(err.to_string())
    }
}

impl ManifestError {
    /// The playlist error behind this error, if any
    pub fn as_hls(&self) -> Option<&HlsError> {
        match self {
            ManifestError::Hls(err) => Some(err),
            _ => None,
        }
    }
}
