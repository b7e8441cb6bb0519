use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use rustls::ClientConfig;
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::{debug, warn};
use url::Url;

use super::{FetchRequest, FetchResponse, RequestMethod, Transport};
use crate::ManifestError;
use crate::config::{ManifestConfig, RetryParameters};

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &ManifestConfig) -> Result<Client, ManifestError> {
    // Create the crypto provider
    let provider = Arc::new(aws_lc_rs::default_provider());

    // Build platform default TLS configuration
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ManifestError::Config(format!("TLS protocol versions: {e}")))?
        .with_platform_verifier()
        .map_err(|e| ManifestError::Config(format!("TLS platform verifier: {e}")))?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5) // Allow multiple connections to same host
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls_config)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(ManifestError::from)
}

/// Server errors and rate limiting may clear up; other failures will not.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// [`Transport`] over HTTP(S) with retries
pub struct HttpTransport {
    client: Client,
    retry: RetryParameters,
}

impl HttpTransport {
    pub fn new(config: &ManifestConfig) -> Result<Self, ManifestError> {
        Ok(Self {
            client: create_client(config)?,
            retry: config.retry.clone(),
        })
    }

    pub fn with_client(client: Client, retry: RetryParameters) -> Self {
        Self { client, retry }
    }

    /// Fetches a resource with retry logic.
    /// Retries on connection errors, timeouts and server errors (5xx).
    async fn fetch_with_retries(
        &self,
        url: &Url,
        request: &FetchRequest,
    ) -> Result<FetchResponse, ManifestError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let method = match request.method {
                RequestMethod::Get => Method::GET,
                RequestMethod::Head => Method::HEAD,
            };
            let mut request_builder = self.client.request(method, url.clone());
            if let Some(range) = &request.byte_range {
                request_builder =
                    request_builder.header(reqwest::header::RANGE, range.to_header_value());
            }
            if !self.retry.timeout.is_zero() {
                request_builder = request_builder.timeout(self.retry.timeout);
            }

            let last_error = match request_builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let uri = response.url().to_string();
                        let headers = response
                            .headers()
                            .iter()
                            .filter_map(|(name, value)| {
                                value
                                    .to_str()
                                    .ok()
                                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
                            })
                            .collect::<HashMap<_, _>>();
                        let data = response.bytes().await?;
                        debug!(uri = %uri, bytes = data.len(), attempts, "Fetched resource");
                        return Ok(FetchResponse { uri, data, headers });
                    }
                    let error = ManifestError::HttpStatus {
                        uri: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !is_retryable_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => {
                    if !e.is_connect() && !e.is_timeout() && !e.is_request() {
                        // Non-retryable network errors
                        return Err(ManifestError::from(e));
                    }
                    ManifestError::from(e)
                }
            };

            if attempts >= max_attempts {
                return Err(last_error);
            }

            let delay = self.retry.delay_for_attempt(attempts);
            warn!(
                uri = %url,
                attempt = attempts,
                max_attempts,
                error = %last_error,
                delay_ms = delay.as_millis() as u64,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, ManifestError> {
        let url = Url::parse(&request.uri)?;
        self.fetch_with_retries(&url, &request).await
    }
}
