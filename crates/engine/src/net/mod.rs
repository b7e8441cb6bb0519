//! Network access used by the parser.
//!
//! The parser only talks to a [`Transport`]; retry policy, TLS and HTTP
//! details live behind it.

mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use hls::ByteRange;

use crate::ManifestError;

pub use http::{HttpTransport, create_client};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Head,
}

/// A single request for a resource or part of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub uri: String,
    pub method: RequestMethod,
    /// Inclusive byte range, `None` for the whole resource
    pub byte_range: Option<ByteRange>,
}

impl FetchRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: RequestMethod::Get,
            byte_range: None,
        }
    }

    pub fn head(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: RequestMethod::Head,
            byte_range: None,
        }
    }

    pub fn with_byte_range(mut self, byte_range: Option<ByteRange>) -> Self {
        self.byte_range = byte_range;
        self
    }
}

/// Response body and headers of a completed request
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// Final URI after redirects
    pub uri: String,
    pub data: Bytes,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
}

impl FetchResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Fetches resources for the parser.
///
/// Implementations own their retry policy; the parser treats every error as
/// final.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ManifestError>;
}
