//! The comment-enrichment pipeline
//!
//! Four stages composed in strict sequence per page: fetch → detect →
//! translate → classify. Each stage fans out one request per comment and
//! joins before the next stage starts; output order always matches input
//! order, never completion order, and the output is positionally aligned
//! with the fetched page.
//!
//! Failure policy differs by stage and the asymmetry is intentional:
//! detection fails open per item, translation fails the whole page, and
//! classification inspects the embedded payload status (401 fails the page
//! as an authentication error, an empty result degrades per item).

use futures_util::future::{join_all, try_join_all};
use tracing::{debug, warn};

use crate::clients::ServiceClients;
use crate::error::{GatewayError, GatewayResult};
use crate::inference::{
    normalize_lang, translatable, CallerIdentity, InferenceClient, LanguageDetection,
    ResponseEnvelope, SentimentScore,
};
use crate::youtube::Comment;

/// Fixed page-size ceiling for comment analysis; not caller-configurable.
pub const MAX_ANALYZE_COMMENTS: u32 = 10;

/// Attached when the detected source language was translated to English.
/// `source_language` is the detector's original label (`zh_cht`, not the
/// normalized `zh`), `score` its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub source_language: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: String,
    pub confidence: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            label: "UNKNOWN".to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichedComment {
    pub comment: Comment,
    pub translation: Option<Translation>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone)]
pub struct CommentAnalysisPage {
    pub results: Vec<EnrichedComment>,
    pub next_page_token: String,
}

/// Run one page of comments for `video_id` through the full pipeline.
///
/// A page with no comments short-circuits before any inference call and
/// reports an empty continuation token.
pub async fn analyze_comments(
    clients: &ServiceClients,
    caller: &CallerIdentity,
    video_id: &str,
    page_token: &str,
) -> GatewayResult<CommentAnalysisPage> {
    let page = clients
        .youtube
        .comment_threads(video_id, MAX_ANALYZE_COMMENTS, page_token)
        .await?;
    debug!(video_id, count = page.comments.len(), "fetched comment page");

    if page.comments.is_empty() {
        return Ok(CommentAnalysisPage {
            results: Vec::new(),
            next_page_token: String::new(),
        });
    }

    let detections = detect_languages(&clients.inference, caller, &page.comments).await;
    let translated =
        translate_supported(&clients.inference, caller, &page.comments, &detections).await?;
    let results = classify_sentiments(&clients.inference, caller, translated).await?;

    Ok(CommentAnalysisPage {
        results,
        next_page_token: page.next_page_token,
    })
}

/// Stage 2: per-comment language detection, fan-out/fan-in.
///
/// Fails open: a per-comment error degrades to `None` so that comment falls
/// through untranslated to sentiment classification on its original text.
async fn detect_languages(
    inference: &InferenceClient,
    caller: &CallerIdentity,
    comments: &[Comment],
) -> Vec<Option<LanguageDetection>> {
    join_all(comments.iter().map(|comment| async move {
        match inference.detect_language(&comment.text, caller).await {
            Ok(detection) => detection,
            Err(err) => {
                warn!(error = %err, "ignoring language detection failure");
                None
            }
        }
    }))
    .await
}

/// Stage 3: translate comments whose detected language is in the supported
/// set; everything else passes through unchanged.
///
/// Fails closed: a single translation failure fails the whole page. This
/// intentionally differs from the detector's fail-open policy.
async fn translate_supported(
    inference: &InferenceClient,
    caller: &CallerIdentity,
    comments: &[Comment],
    detections: &[Option<LanguageDetection>],
) -> GatewayResult<Vec<(Comment, Option<Translation>)>> {
    try_join_all(
        comments
            .iter()
            .zip(detections.iter())
            .map(|(comment, detection)| async move {
                match translation_source(detection) {
                    None => Ok((comment.clone(), None)),
                    Some((label, score)) => {
                        let text = inference
                            .translate_to_english(normalize_lang(label), &comment.text, caller)
                            .await?;
                        debug!(source = label, "translated comment");
                        Ok((
                            comment.clone(),
                            Some(Translation {
                                text,
                                source_language: label.to_string(),
                                score,
                            }),
                        ))
                    }
                }
            }),
    )
    .await
}

/// A comment is eligible for translation when detection produced a non-empty
/// label with a non-zero score and the normalized label is in the supported
/// set. Returns the detector's original label and its confidence.
fn translation_source(detection: &Option<LanguageDetection>) -> Option<(&str, f64)> {
    let detection = detection.as_ref()?;
    let label = detection.label.as_deref().filter(|l| !l.is_empty())?;
    let score = detection.score.filter(|s| *s > 0.0)?;
    translatable(label).then_some((label, score))
}

/// Stage 4: per-comment sentiment classification over the translated text
/// when present, else the original text. Join first, then inspect every
/// envelope positionally.
async fn classify_sentiments(
    inference: &InferenceClient,
    caller: &CallerIdentity,
    comments: Vec<(Comment, Option<Translation>)>,
) -> GatewayResult<Vec<EnrichedComment>> {
    let envelopes = try_join_all(comments.iter().map(|(comment, translation)| {
        let target = translation
            .as_ref()
            .map_or(comment.text.as_str(), |t| t.text.as_str());
        inference.classify_sentiment(target, caller)
    }))
    .await?;

    comments
        .into_iter()
        .zip(envelopes)
        .map(|((comment, translation), envelope)| {
            let sentiment = sentiment_from_envelope(envelope)?;
            Ok(EnrichedComment {
                comment,
                translation,
                sentiment,
            })
        })
        .collect()
}

/// Payload-inspection policy for one classification envelope: an embedded
/// 401 fails the page with an authentication error, any other embedded
/// status fails it generically, and an empty result degrades to UNKNOWN/0
/// for that comment alone.
fn sentiment_from_envelope(
    envelope: ResponseEnvelope<SentimentScore>,
) -> GatewayResult<Sentiment> {
    match envelope {
        ResponseEnvelope::Failure(failure) if failure.status_code == 401 => {
            Err(GatewayError::unauthorized(failure.body))
        }
        ResponseEnvelope::Failure(failure) => {
            warn!(
                status = failure.status_code,
                "sentiment service reported embedded failure"
            );
            Err(GatewayError::Upstream(
                failure.body.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
        ResponseEnvelope::Results(results) => Ok(results
            .into_iter()
            .next()
            .map(|s| Sentiment {
                label: s.label,
                confidence: s.score,
            })
            .unwrap_or_default()),
    }
}
