//! Entry point of a parse.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::master::ManifestBuilder;
use super::media_playlist::StreamBuilder;
use super::player::PlayerInterface;
use super::stream_cache::StreamCache;
use crate::ManifestError;
use crate::config::ManifestConfig;
use crate::model::Manifest;
use crate::net::{FetchRequest, HttpTransport, Transport};

/// Parses an HLS master playlist and every media playlist it references
/// into a [`Manifest`].
///
/// # Example
///
/// ```no_run
/// use manifest_engine::{HlsParser, ManifestConfig, PlayerInterface};
///
/// # async fn run() -> Result<(), manifest_engine::ManifestError> {
/// let parser = HlsParser::with_http_transport(ManifestConfig::default())?;
/// let manifest = parser
///     .start("https://example.com/master.m3u8", &PlayerInterface::default())
///     .await?;
/// println!("{} variants", manifest.periods[0].variants.len());
/// # Ok(())
/// # }
/// ```
pub struct HlsParser {
    config: Arc<ManifestConfig>,
    transport: Arc<dyn Transport>,
    cancellation: CancellationToken,
}

impl HlsParser {
    pub fn new(config: ManifestConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            cancellation: CancellationToken::new(),
        }
    }

    /// Parser fetching over HTTP(S) with the configured retry policy
    pub fn with_http_transport(config: ManifestConfig) -> Result<Self, ManifestError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Build the presentation graph for `master_uri`.
    ///
    /// Any error aborts the whole parse and no partial manifest is returned.
    /// Once [`stop`](Self::stop) is called, this returns
    /// [`ManifestError::Cancelled`] and all in-flight requests are dropped.
    pub async fn start(
        &self,
        master_uri: &str,
        interface: &PlayerInterface,
    ) -> Result<Manifest, ManifestError> {
        let master_uri = Url::parse(master_uri)?;

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                info!(uri = %master_uri, "Parse cancelled");
                Err(ManifestError::Cancelled)
            }
            result = self.parse(&master_uri, interface) => result,
        }
    }

    /// Abort any running and future [`start`](Self::start) call
    pub fn stop(&self) {
        debug!("Stopping parser");
        self.cancellation.cancel();
    }

    async fn parse(
        &self,
        master_uri: &Url,
        interface: &PlayerInterface,
    ) -> Result<Manifest, ManifestError> {
        info!(uri = %master_uri, "Loading master playlist");
        let response = self
            .transport
            .fetch(FetchRequest::get(master_uri.as_str()))
            .await?;
        let base = Url::parse(&response.uri).unwrap_or_else(|_| master_uri.clone());
        let text = String::from_utf8_lossy(&response.data);

        // One cache per parse, dropped with it.
        let cache = StreamCache::new(StreamBuilder::new(
            self.transport.clone(),
            self.config.clone(),
        ));
        ManifestBuilder::new(cache, &self.config, interface)
            .build(&text, &base)
            .await
    }
}
