//! Top-level comment threads for a single video.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{CommentThread, PlatformApi};
use crate::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoComment {
    pub comment_id: String,
    pub author: String,
    pub text: String,
    pub likes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

pub struct CommentFetcher<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: PlatformApi + ?Sized> CommentFetcher<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Pages through the video's comment threads until the platform runs out
    /// of pages or `limit` comments were collected. Errors propagate; the
    /// caller decides whether a missing comment section matters.
    pub fn fetch(&self, video_id: &str, limit: Option<usize>) -> ApiResult<Vec<VideoComment>> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        if limit == Some(0) {
            return Ok(comments);
        }

        loop {
            let page = self.api.comment_threads(video_id, page_token.as_deref())?;
            for thread in page.items {
                let Some(comment) = comment_from_thread(thread) else {
                    debug!(video_id, "skipping comment thread without a top-level comment");
                    continue;
                };
                comments.push(comment);
                if limit.is_some_and(|limit| comments.len() >= limit) {
                    info!(video_id, count = comments.len(), "comment limit reached");
                    return Ok(comments);
                }
            }

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    warn!(video_id, token = %token, "comment page token repeated; stopping pagination");
                    break;
                }
                None => break,
            }
        }

        info!(video_id, count = comments.len(), "fetched comments");
        Ok(comments)
    }
}

fn comment_from_thread(thread: CommentThread) -> Option<VideoComment> {
    let top = thread.snippet?.top_level_comment?;
    let snippet = top.snippet?;
    Some(VideoComment {
        comment_id: top.id.or(thread.id).unwrap_or_default(),
        author: snippet.author_display_name.unwrap_or_default(),
        text: snippet.text_display.unwrap_or_default(),
        likes: snippet.like_count.unwrap_or(0),
        published_at: snippet.published_at,
    })
}
