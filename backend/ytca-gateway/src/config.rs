//! Configuration for the YTCA gateway
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Keys shipped in env templates default to this placeholder; treat it the
/// same as unset.
const PLACEHOLDER_KEY: &str = "change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// YouTube Data API access
    pub youtube: YoutubeConfig,

    /// Inference endpoint chain (language detection, translation, sentiment)
    pub inference: InferenceConfig,

    /// Browser origins allowed to call the gateway
    pub cors: CorsConfig,

    /// GraphQL configuration
    pub graphql: GraphQLConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub base_url: String,
    /// Shared credential for outbound inference calls. When absent, the
    /// caller's own `Authorization` header is forwarded instead; the mode is
    /// fixed for the lifetime of the process.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Enable GraphQL Playground
    pub playground: bool,
    /// Enable introspection
    pub introspection: bool,
}

impl Config {
    /// Load configuration from environment variables and an optional .env
    /// file. Fails fast when the YouTube API key is missing so a misconfigured
    /// deployment never starts serving.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let Some(api_key) = non_placeholder(env::var("GOOGLE_API_KEY").ok()) else {
            bail!(
                "GOOGLE_API_KEY must be set - see \
                 https://developers.google.com/youtube/v3/getting-started"
            );
        };

        let inference_key = non_placeholder(env::var("TIYARO_API_KEY").ok());
        if inference_key.is_some() {
            info!("inference credential mode: shared key");
        } else {
            info!("inference credential mode: forwarding caller headers");
        }

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(3001),
                workers: env::var("SERVER_WORKERS")
                    .ok()
                    .and_then(|w| w.parse().ok())
                    .unwrap_or_else(num_cpus::get),
            },
            youtube: YoutubeConfig {
                base_url: env::var("YOUTUBE_API_BASE_URL")
                    .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string()),
                api_key,
            },
            inference: InferenceConfig {
                base_url: env::var("INFERENCE_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.tiyaro.ai/v1/ent".to_string()),
                api_key: inference_key,
            },
            cors: CorsConfig {
                allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| {
                        "https://www.youtube.com,http://localhost:3000".to_string()
                    })
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            graphql: GraphQLConfig {
                playground: env::var("GRAPHQL_PLAYGROUND")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
                introspection: env::var("GRAPHQL_INTROSPECTION")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
            },
        })
    }
}

fn non_placeholder(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != PLACEHOLDER_KEY)
}
