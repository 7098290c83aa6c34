//! Fakes shared by the unit tests of the pipeline modules.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use axum::Router;
use serde_json::json;

use crate::api::{
    Channel, CommentThread, ListResponse, PlatformApi, PlaylistItem, SearchResult, Video,
};
use crate::error::{ApiError, ApiResult};

/// Serves `router` on an ephemeral localhost port from a background thread and
/// returns its base URL.
pub fn spawn_stub_server(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    format!("http://{addr}")
}

pub struct FakeUpload {
    pub video_id: String,
    pub title: String,
}

/// In-memory channel catalogue that answers like the Data API and records
/// every call it receives.
pub struct FakePlatformApi {
    channels: Vec<(String, String, Option<String>)>,
    uploads: HashMap<String, Vec<FakeUpload>>,
    videos: HashMap<String, serde_json::Value>,
    comments: HashMap<String, Vec<serde_json::Value>>,
    page_size: usize,
    pub fail_search: bool,
    pub fail_playlist_page: Option<usize>,
    pub fail_videos: HashSet<String>,
    /// Continuation tokens handed out in rotation instead of real offsets.
    pub token_cycle: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl Default for FakePlatformApi {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            uploads: HashMap::new(),
            videos: HashMap::new(),
            comments: HashMap::new(),
            page_size: 50,
            fail_search: false,
            fail_playlist_page: None,
            fail_videos: HashSet::new(),
            token_cycle: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakePlatformApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Registers a channel and its uploads. Every upload also gets a video
    /// record unless `without_stats` lists it.
    pub fn with_channel(mut self, title: &str, video_ids: &[&str], without_stats: &[&str]) -> Self {
        let channel_id = format!("UC{}", self.channels.len());
        let uploads_id = format!("UU{}", self.channels.len());
        self.channels
            .push((title.to_string(), channel_id, Some(uploads_id.clone())));
        let uploads = video_ids
            .iter()
            .map(|id| FakeUpload {
                video_id: id.to_string(),
                title: format!("Listed {id}"),
            })
            .collect();
        self.uploads.insert(uploads_id, uploads);
        for id in video_ids {
            if !without_stats.contains(id) {
                self.videos
                    .insert(id.to_string(), video_value(id, title, 100, "PT1M"));
            }
        }
        self
    }

    pub fn with_channel_without_uploads(mut self, title: &str) -> Self {
        let channel_id = format!("UC{}", self.channels.len());
        self.channels.push((title.to_string(), channel_id, None));
        self
    }

    pub fn with_video(mut self, id: &str, value: serde_json::Value) -> Self {
        self.videos.insert(id.to_string(), value);
        self
    }

    pub fn with_comments(mut self, video_id: &str, threads: Vec<serde_json::Value>) -> Self {
        self.comments.insert(video_id.to_string(), threads);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn page<T: serde::de::DeserializeOwned>(
        &self,
        values: Vec<serde_json::Value>,
        page_token: Option<&str>,
        page_size: usize,
    ) -> ApiResult<ListResponse<T>> {
        let start: usize = page_token
            .map(|token| token.trim_start_matches('p').parse().unwrap())
            .unwrap_or(0);
        let end = (start + page_size).min(values.len());
        let next = if !self.token_cycle.is_empty() {
            let position = page_token
                .and_then(|token| self.token_cycle.iter().position(|cycled| *cycled == token))
                .map_or(0, |index| (index + 1) % self.token_cycle.len());
            Some(self.token_cycle[position].to_string())
        } else if end < values.len() {
            Some(format!("p{end}"))
        } else {
            None
        };
        let body = json!({
            "items": values[start..end].to_vec(),
            "nextPageToken": next,
        });
        serde_json::from_value(body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

pub fn video_value(id: &str, channel: &str, views: u64, duration: &str) -> serde_json::Value {
    json!({
        "id": id,
        "snippet": {
            "title": format!("Stats {id}"),
            "description": format!("Stats description {id}"),
            "channelTitle": channel,
            "publishedAt": "2024-03-01T12:00:00Z",
        },
        "statistics": {
            "viewCount": views.to_string(),
            "likeCount": "10",
            "commentCount": "2",
        },
        "contentDetails": { "duration": duration },
    })
}

pub fn comment_value(id: &str, author: &str, text: &str, likes: u64) -> serde_json::Value {
    json!({
        "id": id,
        "snippet": {
            "topLevelComment": {
                "id": id,
                "snippet": {
                    "authorDisplayName": author,
                    "textDisplay": text,
                    "likeCount": likes,
                    "publishedAt": "2024-03-02T08:30:00Z",
                }
            }
        }
    })
}

impl PlatformApi for FakePlatformApi {
    fn search_channels(&self, query: &str) -> ApiResult<ListResponse<SearchResult>> {
        self.record(format!("search:{query}"));
        if self.fail_search {
            return Err(ApiError::Transport("connection reset".into()));
        }
        let items: Vec<serde_json::Value> = self
            .channels
            .iter()
            .filter(|(title, _, _)| title.to_lowercase().contains(&query.to_lowercase()))
            .take(1)
            .map(|(title, id, _)| {
                json!({ "id": { "channelId": id }, "snippet": { "channelTitle": title } })
            })
            .collect();
        serde_json::from_value(json!({ "items": items }))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn channel_content_details(&self, channel_id: &str) -> ApiResult<ListResponse<Channel>> {
        self.record(format!("channels:{channel_id}"));
        let items: Vec<serde_json::Value> = self
            .channels
            .iter()
            .filter(|(_, id, _)| id == channel_id)
            .map(|(_, id, uploads)| match uploads {
                Some(uploads) => json!({
                    "id": id,
                    "contentDetails": { "relatedPlaylists": { "uploads": uploads } }
                }),
                None => json!({ "id": id, "contentDetails": {} }),
            })
            .collect();
        serde_json::from_value(json!({ "items": items }))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<PlaylistItem>> {
        let page_number = self.count_calls("playlistItems:");
        self.record(format!("playlistItems:{playlist_id}"));
        if self.fail_playlist_page == Some(page_number) {
            return Err(ApiError::Status {
                status: 500,
                message: "backend error".into(),
            });
        }
        let values = self
            .uploads
            .get(playlist_id)
            .map(|uploads| {
                uploads
                    .iter()
                    .map(|upload| {
                        json!({
                            "snippet": {
                                "title": upload.title,
                                "description": format!("Listed description {}", upload.video_id),
                                "publishedAt": "2024-03-01T12:00:00Z",
                                "resourceId": { "videoId": upload.video_id },
                            }
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.page(values, page_token, self.page_size)
    }

    fn videos(&self, video_id: &str) -> ApiResult<ListResponse<Video>> {
        self.record(format!("videos:{video_id}"));
        if self.fail_videos.contains(video_id) {
            return Err(ApiError::Transport("timed out".into()));
        }
        let items: Vec<serde_json::Value> = self.videos.get(video_id).cloned().into_iter().collect();
        serde_json::from_value(json!({ "items": items }))
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<ListResponse<CommentThread>> {
        self.record(format!("commentThreads:{video_id}"));
        let values = self.comments.get(video_id).cloned().unwrap_or_default();
        self.page(values, page_token, self.page_size)
    }
}
