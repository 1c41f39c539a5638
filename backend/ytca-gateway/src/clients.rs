//! Outbound HTTP clients for the upstream collaborators
//!
//! One `reqwest::Client` is built at startup and shared by both the YouTube
//! and inference clients; HTTP/1.1 keep-alive and the connection pool are
//! reused across all requests. The client carries no request timeout: each
//! outbound call resolves or rejects on its own.

use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::inference::{CredentialMode, InferenceClient};
use crate::youtube::YoutubeClient;

#[derive(Clone)]
pub struct ServiceClients {
    pub youtube: YoutubeClient,
    pub inference: InferenceClient,
}

impl ServiceClients {
    /// Build both clients from configuration. The inference credential mode
    /// is resolved here, once, and never re-read from the environment.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::new();

        let credentials = match &config.inference.api_key {
            Some(key) => CredentialMode::Shared(key.clone()),
            None => CredentialMode::Forward,
        };

        Self {
            youtube: YoutubeClient::new(
                http.clone(),
                config.youtube.base_url.clone(),
                config.youtube.api_key.clone(),
            ),
            inference: InferenceClient::new(
                http,
                config.inference.base_url.clone(),
                credentials,
            ),
        }
    }
}

/// Map a non-success upstream HTTP status into the request-level taxonomy,
/// reading the body for embedded failure detail first.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> GatewayResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GatewayError::from_status(status.as_u16(), &body))
}
