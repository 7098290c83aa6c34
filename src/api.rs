//! YouTube Data API v3 access.
//!
//! `PlatformApi` is the authenticated client handle the pipeline depends on.
//! One method per upstream endpoint keeps fakes trivial to write; the real
//! implementation is [`HttpPlatformApi`], a blocking `ureq` client.
//!
//! The wire structs only model the fields the pipeline reads. Everything is
//! optional because the platform omits fields for private, deleted, or
//! engagement-hidden videos, and deciding what is "required" is the caller's
//! job.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::RuntimeSettings;
use crate::error::{ApiError, ApiResult};

/// Largest page `playlistItems.list` will serve.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;
/// Largest page `commentThreads.list` will serve.
pub const COMMENT_PAGE_SIZE: u32 = 100;

/// Generic `*ListResponse` envelope shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<SearchResultId>,
    #[serde(default)]
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub channel_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedPlaylists {
    #[serde(default)]
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: Option<PlaylistItemSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
    #[serde(default)]
    pub content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Counts arrive as decimal strings (`"viewCount": "1234"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<CommentThreadSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default)]
    pub top_level_comment: Option<Comment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<CommentSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub text_display: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// The upstream endpoints the pipeline consumes.
pub trait PlatformApi {
    /// `search.list` restricted to channels, top result only.
    fn search_channels(&self, query: &str) -> ApiResult<ListResponse<SearchResult>>;

    /// `channels.list` with the `contentDetails` part.
    fn channel_content_details(&self, channel_id: &str) -> ApiResult<ListResponse<Channel>>;

    /// One page of `playlistItems.list` (`snippet`, [`PLAYLIST_PAGE_SIZE`] items).
    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<PlaylistItem>>;

    /// `videos.list` with `snippet,statistics,contentDetails`.
    fn videos(&self, video_id: &str) -> ApiResult<ListResponse<Video>>;

    /// One page of plain-text `commentThreads.list`.
    fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<CommentThread>>;
}

/// Blocking client for the real Data API (or anything speaking its dialect).
#[derive(Clone)]
pub struct HttpPlatformApi {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpPlatformApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self::new(
            settings.api_base_url.clone(),
            settings.api_key.clone(),
            settings.http_timeout,
        )
    }

    fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, &str)]) -> ApiResult<T> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!(resource, "calling YouTube Data API");

        let mut request = self.agent.get(&url);
        for (name, value) in params {
            request = request.query(name, value);
        }
        if !self.api_key.is_empty() {
            request = request.query("key", &self.api_key);
        }

        let response = request.call()?;
        response
            .into_json::<T>()
            .map_err(|err| ApiError::Decode(format!("{resource}: {err}")))
    }
}

impl PlatformApi for HttpPlatformApi {
    fn search_channels(&self, query: &str) -> ApiResult<ListResponse<SearchResult>> {
        self.get(
            "search",
            &[
                ("part", "snippet"),
                ("q", query),
                ("type", "channel"),
                ("maxResults", "1"),
            ],
        )
    }

    fn channel_content_details(&self, channel_id: &str) -> ApiResult<ListResponse<Channel>> {
        self.get("channels", &[("part", "contentDetails"), ("id", channel_id)])
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<PlaylistItem>> {
        let page_size = PLAYLIST_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get("playlistItems", &params)
    }

    fn videos(&self, video_id: &str) -> ApiResult<ListResponse<Video>> {
        self.get(
            "videos",
            &[("part", "snippet,statistics,contentDetails"), ("id", video_id)],
        )
    }

    fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<CommentThread>> {
        let page_size = COMMENT_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", page_size.as_str()),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get("commentThreads", &params)
    }
}
