//! Channel title → ordered list of uploaded videos.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{PlatformApi, PlaylistItem};
use crate::error::{AcquisitionError, ApiError};

/// Basic metadata for one upload, as listed in the channel's uploads playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub description: String,
}

/// Channel picked by the upstream search for a free-text title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub channel_id: String,
    pub title: Option<String>,
}

pub struct ChannelVideoLister<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: PlatformApi + ?Sized> ChannelVideoLister<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Lists up to `max_results` uploads of the channel whose title best
    /// matches `channel_title`, in the order the platform returns them.
    ///
    /// Only [`AcquisitionError::ChannelNotFound`] is returned as an error.
    /// Transport and API failures are logged and produce an empty listing, so
    /// an empty result means "unknown", not "channel has no uploads".
    pub fn list(
        &self,
        channel_title: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<VideoSummary>, AcquisitionError> {
        if max_results == Some(0) {
            return Ok(Vec::new());
        }

        match self.try_list(channel_title, max_results) {
            Ok(videos) => {
                info!(
                    channel = channel_title,
                    count = videos.len(),
                    "listed channel uploads"
                );
                Ok(videos)
            }
            Err(AcquisitionError::Transport(err)) => {
                warn!(
                    channel = channel_title,
                    error = %err,
                    "listing channel uploads failed; returning an empty listing"
                );
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Takes the top channel search hit for `channel_title`. Ambiguous titles
    /// are not disambiguated.
    pub fn resolve_channel(&self, channel_title: &str) -> Result<ResolvedChannel, AcquisitionError> {
        let response = self.api.search_channels(channel_title)?;
        let Some(first) = response.items.into_iter().next() else {
            return Err(AcquisitionError::ChannelNotFound(channel_title.to_string()));
        };

        let channel_id = first
            .id
            .and_then(|id| id.channel_id)
            .ok_or_else(|| ApiError::Decode("search result without a channelId".into()))?;
        let title = first.snippet.and_then(|snippet| snippet.channel_title);
        info!(
            query = channel_title,
            channel_id = %channel_id,
            title = title.as_deref().unwrap_or("<untitled>"),
            "resolved channel"
        );

        Ok(ResolvedChannel { channel_id, title })
    }

    fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, AcquisitionError> {
        let response = self.api.channel_content_details(channel_id)?;
        response
            .items
            .into_iter()
            .next()
            .and_then(|channel| channel.content_details)
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .ok_or_else(|| {
                ApiError::Decode(format!("channel {channel_id} has no uploads playlist")).into()
            })
    }

    fn try_list(
        &self,
        channel_title: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<VideoSummary>, AcquisitionError> {
        let channel = self.resolve_channel(channel_title)?;
        let playlist_id = self.uploads_playlist_id(&channel.channel_id)?;

        let mut videos = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .api
                .playlist_items(&playlist_id, page_token.as_deref())?;

            for item in page.items {
                let Some(summary) = summary_from_item(item) else {
                    debug!(playlist = %playlist_id, "skipping playlist item without a video id");
                    continue;
                };
                if !seen_ids.insert(summary.video_id.clone()) {
                    continue;
                }
                debug!(video_id = %summary.video_id, title = %summary.title, "found upload");
                videos.push(summary);

                if max_results.is_some_and(|max| videos.len() >= max) {
                    return Ok(videos);
                }
            }

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    warn!(playlist = %playlist_id, token = %token, "page token repeated; stopping pagination");
                    break;
                }
                None => break,
            }
        }

        Ok(videos)
    }
}

fn summary_from_item(item: PlaylistItem) -> Option<VideoSummary> {
    let snippet = item.snippet?;
    let video_id = snippet.resource_id?.video_id?;
    Some(VideoSummary {
        video_id,
        title: snippet.title.unwrap_or_default(),
        published_at: snippet.published_at.unwrap_or_default(),
        description: snippet.description.unwrap_or_default(),
    })
}
