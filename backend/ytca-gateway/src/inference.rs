//! Clients for the ML inference collaborators
//!
//! All three models sit behind the same gateway chain and share a wire
//! envelope: the `response` field is either an array of results or an
//! embedded failure object carrying an HTTP-like status. What each stage
//! does with that envelope differs and is decided in the pipeline, not here.

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::clients::ensure_success;
use crate::error::{GatewayError, GatewayResult};

/// Source languages the translation collaborator can render into English.
pub const TRANSLATABLE_LANGS: [&str; 8] = ["ar", "es", "fr", "hi", "ja", "pt", "ru", "zh"];

/// The detector labels Traditional and Simplified Chinese separately; the
/// translation endpoints know only `zh`.
pub fn normalize_lang(label: &str) -> &str {
    match label {
        "zh_chs" | "zh_cht" => "zh",
        other => other,
    }
}

pub fn translatable(label: &str) -> bool {
    TRANSLATABLE_LANGS.contains(&normalize_lang(label))
}

/// How outbound inference calls are authorized. Fixed for the lifetime of
/// the process: a configured shared key wins, otherwise the caller's own
/// headers are forwarded.
#[derive(Debug, Clone)]
pub enum CredentialMode {
    Shared(String),
    Forward,
}

/// Headers captured from the inbound request, forwarded verbatim in
/// [`CredentialMode::Forward`].
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity {
    pub authorization: Option<String>,
    pub forwarded_for: Option<String>,
}

impl CredentialMode {
    fn apply(
        &self,
        req: reqwest::RequestBuilder,
        caller: &CallerIdentity,
    ) -> reqwest::RequestBuilder {
        match self {
            Self::Shared(key) => req.header(AUTHORIZATION, format!("Bearer {key}")),
            Self::Forward => {
                let mut req = req;
                if let Some(auth) = &caller.authorization {
                    req = req.header(AUTHORIZATION, auth);
                }
                if let Some(fwd) = &caller.forwarded_for {
                    req = req.header("X-Forwarded-For", fwd);
                }
                req
            }
        }
    }
}

/// Best-guess source language for one piece of text.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageDetection {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct TranslationResult {
    translation_text: String,
}

/// Embedded failure payload: a success HTTP response whose body carries the
/// real (failed) status of the proxied model call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFailure {
    pub status_code: u16,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope<T> {
    Results(Vec<T>),
    Failure(EmbeddedFailure),
}

#[derive(Debug, Deserialize)]
struct InferenceResponse<T> {
    response: ResponseEnvelope<T>,
}

#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialMode,
}

impl InferenceClient {
    pub fn new(http: reqwest::Client, base_url: String, credentials: CredentialMode) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// Detect the source language of `text`. Returns `None` when the model
    /// has no answer (empty result array or an embedded failure); transport
    /// errors surface as `Err` and the caller decides the policy.
    pub async fn detect_language(
        &self,
        text: &str,
        caller: &CallerIdentity,
    ) -> GatewayResult<Option<LanguageDetection>> {
        let url = format!(
            "{}/azure/1/cog-text-language-detect?caching=true",
            self.base_url
        );
        let envelope: ResponseEnvelope<LanguageDetection> =
            self.post(&url, text, caller).await?;

        match envelope {
            ResponseEnvelope::Results(results) => Ok(results.into_iter().next()),
            ResponseEnvelope::Failure(_) => Ok(None),
        }
    }

    /// Translate `text` from `source_lang` (already normalized) to English.
    /// Anything short of a usable translation is an error.
    pub async fn translate_to_english(
        &self,
        source_lang: &str,
        text: &str,
        caller: &CallerIdentity,
    ) -> GatewayResult<String> {
        let url = format!(
            "{}/ibmcloud/1/watson-translation-{}-en?caching=true",
            self.base_url, source_lang
        );
        let envelope: ResponseEnvelope<TranslationResult> =
            self.post(&url, text, caller).await?;

        match envelope {
            ResponseEnvelope::Results(results) => results
                .into_iter()
                .next()
                .map(|r| r.translation_text)
                .ok_or_else(|| {
                    GatewayError::Upstream("empty translation response".to_string())
                }),
            ResponseEnvelope::Failure(failure) => Err(GatewayError::Upstream(
                failure
                    .body
                    .unwrap_or_else(|| format!("translation failed with status {}", failure.status_code)),
            )),
        }
    }

    /// Classify the sentiment of `text`. The raw envelope is returned so the
    /// pipeline can apply the payload-inspection policy (embedded 401 fails
    /// the page, empty result degrades per item).
    pub async fn classify_sentiment(
        &self,
        text: &str,
        caller: &CallerIdentity,
    ) -> GatewayResult<ResponseEnvelope<SentimentScore>> {
        let url = format!(
            "{}/huggingface/1/distilbert-base-uncased-finetuned-sst-2-english?caching=true",
            self.base_url
        );
        self.post(&url, text, caller).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        input: &str,
        caller: &CallerIdentity,
    ) -> GatewayResult<ResponseEnvelope<T>> {
        let req = self
            .http
            .post(url)
            .json(&serde_json::json!({ "input": input }));
        let req = self.credentials.apply(req, caller);

        let resp = ensure_success(req.send().await?).await?;
        let body: InferenceResponse<T> = resp.json().await?;
        Ok(body.response)
    }
}
