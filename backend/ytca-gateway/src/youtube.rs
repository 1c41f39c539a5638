//! YouTube Data API client: comment-thread listing and related-video search
//!
//! Both calls are single-shot request/response proxies; paging is driven by
//! the opaque continuation tokens the API returns (empty string = exhausted).
//! Upstream failures are not retried.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::clients::ensure_success;
use crate::error::GatewayResult;

/// One top-level comment, immutable once fetched.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub like_count: i64,
}

/// A bounded page of comments plus the continuation token for the next one.
#[derive(Debug, Clone)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub next_page_token: String,
}

/// Flattened search result for a playable related video.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct RelatedVideosPage {
    pub videos: Vec<VideoSummary>,
    pub next_page_token: String,
}

// Wire DTOs. The API nests the comment payload three levels deep:
// items[].snippet.topLevelComment.snippet.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: String,
    #[serde(default)]
    like_count: i64,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    id: Option<ResourceId>,
    #[serde(default)]
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// One page of top-level comments for the video, ordered by the
    /// upstream relevance ranking.
    pub async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: &str,
    ) -> GatewayResult<CommentPage> {
        let url = format!(
            "{}/commentThreads?key={}&textFormat=plainText&part=snippet&videoId={}\
             &maxResults={}&pageToken={}&order=relevance",
            self.base_url,
            self.api_key,
            urlencoding::encode(video_id),
            max_results,
            urlencoding::encode(page_token),
        );

        let resp = ensure_success(self.http.get(&url).send().await?).await?;
        let body: CommentThreadListResponse = resp.json().await?;

        let comments = body
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet.top_level_comment.snippet;
                Comment {
                    text: snippet.text_original,
                    published_at: snippet.published_at,
                    like_count: snippet.like_count,
                }
            })
            .collect();

        Ok(CommentPage {
            comments,
            next_page_token: body.next_page_token.unwrap_or_default(),
        })
    }

    /// Up to `max_results` videos related to the given one, filtered to
    /// entries that are actually playable videos.
    pub async fn related_videos(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: &str,
    ) -> GatewayResult<RelatedVideosPage> {
        let url = format!(
            "{}/search?key={}&textFormat=plainText&part=snippet&type=video\
             &relatedToVideoId={}&maxResults={}&pageToken={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(video_id),
            max_results,
            urlencoding::encode(page_token),
        );

        let resp = ensure_success(self.http.get(&url).send().await?).await?;
        let body: SearchListResponse = resp.json().await?;

        let videos = body.items.into_iter().filter_map(map_search_result).collect();

        Ok(RelatedVideosPage {
            videos,
            next_page_token: body.next_page_token.unwrap_or_default(),
        })
    }
}

/// Search returns channels and playlists alongside videos; keep only entries
/// with kind "youtube#video", a non-empty video id, and a snippet.
fn map_search_result(item: SearchResult) -> Option<VideoSummary> {
    let id = item.id?;
    let snippet = item.snippet?;
    if id.kind.as_deref() != Some("youtube#video") {
        return None;
    }
    let video_id = id.video_id.filter(|v| !v.is_empty())?;

    Some(VideoSummary {
        video_id,
        title: snippet.title,
        description: snippet.description,
        channel_id: snippet.channel_id,
        channel_title: snippet.channel_title,
        published_at: snippet.published_at,
        thumbnail: snippet
            .thumbnails
            .and_then(|t| t.default)
            .map(|d| d.url)
            .unwrap_or_default(),
    })
}
