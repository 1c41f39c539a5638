//! Comment-analysis and related-video queries

use async_graphql::{Context, Object, Result as GraphQLResult, SimpleObject};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::clients::ServiceClients;
use crate::inference::CallerIdentity;
use crate::pipeline;
use crate::youtube;

/// Default number of related videos per page when the caller does not ask
/// for a specific count.
const DEFAULT_RELATED_RESULTS: u32 = 10;

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct Sentiment {
    pub label: String,
    pub confidence: f64,
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct Translation {
    /// English rendering of the comment text.
    pub text: String,
    /// The detector's original label, before Chinese normalization.
    pub source_language: String,
    /// The detector's confidence for that label.
    pub score: f64,
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct EnrichedComment {
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
    /// Present only when the comment was translated to English.
    pub translation: Option<Translation>,
    pub sentiment: Sentiment,
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct CommentAnalysisPage {
    pub results: Vec<EnrichedComment>,
    /// Opaque continuation token; empty when the comment stream is exhausted.
    pub next_page_token: String,
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Default thumbnail URL for the video.
    pub thumbnail: String,
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct RelatedVideosPage {
    pub videos: Vec<VideoSummary>,
    pub next_page_token: String,
}

impl From<pipeline::Sentiment> for Sentiment {
    fn from(s: pipeline::Sentiment) -> Self {
        Self {
            label: s.label,
            confidence: s.confidence,
        }
    }
}

impl From<pipeline::Translation> for Translation {
    fn from(t: pipeline::Translation) -> Self {
        Self {
            text: t.text,
            source_language: t.source_language,
            score: t.score,
        }
    }
}

impl From<pipeline::EnrichedComment> for EnrichedComment {
    fn from(c: pipeline::EnrichedComment) -> Self {
        Self {
            text: c.comment.text,
            published_at: c.comment.published_at,
            like_count: c.comment.like_count,
            translation: c.translation.map(Into::into),
            sentiment: c.sentiment.into(),
        }
    }
}

impl From<pipeline::CommentAnalysisPage> for CommentAnalysisPage {
    fn from(page: pipeline::CommentAnalysisPage) -> Self {
        Self {
            results: page.results.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token,
        }
    }
}

impl From<youtube::VideoSummary> for VideoSummary {
    fn from(v: youtube::VideoSummary) -> Self {
        Self {
            video_id: v.video_id,
            title: v.title,
            description: v.description,
            channel_id: v.channel_id,
            channel_title: v.channel_title,
            published_at: v.published_at,
            thumbnail: v.thumbnail,
        }
    }
}

impl From<youtube::RelatedVideosPage> for RelatedVideosPage {
    fn from(page: youtube::RelatedVideosPage) -> Self {
        Self {
            videos: page.videos.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token,
        }
    }
}

#[derive(Default)]
pub struct YoutubeQuery;

#[Object]
impl YoutubeQuery {
    /// Fetch one page of top-level comments for the video and run them
    /// through language detection, conditional translation to English, and
    /// sentiment classification.
    async fn analyze_youtube_comments(
        &self,
        ctx: &Context<'_>,
        video_id: String,
        page_token: Option<String>,
    ) -> GraphQLResult<CommentAnalysisPage> {
        let clients = ctx
            .data::<ServiceClients>()
            .map_err(|_| "Service clients not available")?;
        let caller = ctx
            .data::<CallerIdentity>()
            .cloned()
            .unwrap_or_default();
        let page_token = page_token.unwrap_or_default();
        debug!(%video_id, %page_token, "analyzeYoutubeComments");

        pipeline::analyze_comments(clients, &caller, &video_id, &page_token)
            .await
            .map(Into::into)
            .map_err(|e| e.into_graphql())
    }

    /// Fetch one page of videos related to the given one, filtered to
    /// playable entries.
    async fn get_youtube_related_videos(
        &self,
        ctx: &Context<'_>,
        video_id: String,
        page_token: Option<String>,
        max_results: Option<i32>,
    ) -> GraphQLResult<RelatedVideosPage> {
        let clients = ctx
            .data::<ServiceClients>()
            .map_err(|_| "Service clients not available")?;
        let page_token = page_token.unwrap_or_default();
        let max_results = max_results
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_RELATED_RESULTS);
        debug!(%video_id, %page_token, max_results, "getYoutubeRelatedVideos");

        clients
            .youtube
            .related_videos(&video_id, max_results, &page_token)
            .await
            .map(Into::into)
            .map_err(|e| e.into_graphql())
    }
}
