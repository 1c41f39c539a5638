//! Request-level error taxonomy
//!
//! Per-item soft failures (language detection, empty sentiment results) are
//! absorbed inside the pipeline and never reach this type. Everything else is
//! normalized into one of two kinds at the request boundary so the inbound
//! caller can tell "re-authenticate" apart from a generic upstream failure.

use async_graphql::ErrorExtensions;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// An upstream collaborator reported unauthorized access, either as an
    /// HTTP 401 or as an embedded `statusCode: 401` payload.
    #[error("{0}")]
    Authentication(String),

    /// Any other upstream failure: transport error, non-success status, or a
    /// response body that does not match the wire contract.
    #[error("{0}")]
    Upstream(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Authentication error carrying the upstream body when it has one.
    pub fn unauthorized(body: Option<String>) -> Self {
        let message = body
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "UnAuthorized".to_string());
        Self::Authentication(message)
    }

    /// Classify a non-success upstream HTTP status.
    ///
    /// Inference responses proxied through the gateway chain sometimes carry
    /// the real failure text under `response.body`; use it when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/response/body")
                    .and_then(|b| b.as_str().map(String::from))
            });

        if status == 401 {
            Self::unauthorized(detail)
        } else {
            Self::Upstream(detail.unwrap_or_else(|| format!("upstream returned status {status}")))
        }
    }

    /// Machine-readable code exposed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "UNAUTHENTICATED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
        }
    }

    /// GraphQL rendition: authentication errors keep their upstream message
    /// so clients can prompt for a credential; upstream detail stays in the
    /// logs and the caller sees a stable generic message.
    pub fn into_graphql(self) -> async_graphql::Error {
        let code = self.code();
        let message = match self {
            Self::Authentication(message) => message,
            Self::Upstream(detail) => {
                warn!(detail = %detail, "upstream call failed");
                "API call failed".to_string()
            }
        };
        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}
