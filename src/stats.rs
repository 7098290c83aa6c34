//! Per-video public metrics.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{PlatformApi, Video};

/// Public metrics and metadata for a single video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub publication_date: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub duration: String,
    pub description: String,
}

pub struct VideoStatsFetcher<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: PlatformApi + ?Sized> VideoStatsFetcher<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Looks up one video. `None` covers deleted/private ids, records missing
    /// a required field, and transport failures (which are logged).
    pub fn fetch(&self, video_id: &str) -> Option<VideoStats> {
        let response = match self.api.videos(video_id) {
            Ok(response) => response,
            Err(err) => {
                warn!(video_id, error = %err, "fetching video statistics failed");
                return None;
            }
        };

        let Some(video) = response.items.into_iter().next() else {
            debug!(video_id, "no video matched the id");
            return None;
        };

        match stats_from_video(video_id, video) {
            Ok(stats) => Some(stats),
            Err(field) => {
                warn!(video_id, field, "video record is missing or has an invalid field");
                None
            }
        }
    }
}

/// Builds `VideoStats`, naming the first unusable field on failure. Only the
/// three counters may be absent; they default to zero.
fn stats_from_video(video_id: &str, video: Video) -> Result<VideoStats, &'static str> {
    let snippet = video.snippet.ok_or("snippet")?;
    let duration = video
        .content_details
        .and_then(|details| details.duration)
        .ok_or("contentDetails.duration")?;
    let statistics = video.statistics;
    let count = |value: Option<&String>, field: &'static str| -> Result<u64, &'static str> {
        match value {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| field),
            None => Ok(0),
        }
    };

    Ok(VideoStats {
        video_id: video_id.to_string(),
        title: snippet.title.ok_or("snippet.title")?,
        channel_name: snippet.channel_title.ok_or("snippet.channelTitle")?,
        publication_date: snippet.published_at.ok_or("snippet.publishedAt")?,
        view_count: count(
            statistics.as_ref().and_then(|s| s.view_count.as_ref()),
            "statistics.viewCount",
        )?,
        like_count: count(
            statistics.as_ref().and_then(|s| s.like_count.as_ref()),
            "statistics.likeCount",
        )?,
        comment_count: count(
            statistics.as_ref().and_then(|s| s.comment_count.as_ref()),
            "statistics.commentCount",
        )?,
        duration,
        description: snippet.description.ok_or("snippet.description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePlatformApi, video_value};
    use serde_json::json;

    #[test]
    fn fetch_builds_stats_from_all_parts() {
        let api = FakePlatformApi::new().with_video("abc", video_value("abc", "Chan", 1234, "PT4M2S"));
        let stats = VideoStatsFetcher::new(&api).fetch("abc").unwrap();
        assert_eq!(
            stats,
            VideoStats {
                video_id: "abc".into(),
                title: "Stats abc".into(),
                channel_name: "Chan".into(),
                publication_date: "2024-03-01T12:00:00Z".into(),
                view_count: 1234,
                like_count: 10,
                comment_count: 2,
                duration: "PT4M2S".into(),
                description: "Stats description abc".into(),
            }
        );
        assert_eq!(api.calls(), vec!["videos:abc".to_string()]);
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let mut value = video_value("quiet", "Chan", 5, "PT1S");
        value["statistics"] = json!({ "viewCount": "5" });
        let api = FakePlatformApi::new().with_video("quiet", value);
        let stats = VideoStatsFetcher::new(&api).fetch("quiet").unwrap();
        assert_eq!(stats.view_count, 5);
        assert_eq!(stats.like_count, 0);
        assert_eq!(stats.comment_count, 0);
    }

    #[test]
    fn missing_statistics_part_defaults_counts() {
        let mut value = video_value("bare", "Chan", 5, "PT1S");
        value.as_object_mut().unwrap().remove("statistics");
        let api = FakePlatformApi::new().with_video("bare", value);
        let stats = VideoStatsFetcher::new(&api).fetch("bare").unwrap();
        assert_eq!(
            (stats.view_count, stats.like_count, stats.comment_count),
            (0, 0, 0)
        );
    }

    #[test]
    fn deleted_video_is_absent() {
        let api = FakePlatformApi::new();
        assert!(VideoStatsFetcher::new(&api).fetch("gone").is_none());
    }

    #[test]
    fn missing_required_field_is_absent() {
        let mut value = video_value("nodur", "Chan", 5, "PT1S");
        value["contentDetails"] = json!({});
        let api = FakePlatformApi::new().with_video("nodur", value);
        assert!(VideoStatsFetcher::new(&api).fetch("nodur").is_none());

        let mut value = video_value("notitle", "Chan", 5, "PT1S");
        value["snippet"].as_object_mut().unwrap().remove("title");
        let api = FakePlatformApi::new().with_video("notitle", value);
        assert!(VideoStatsFetcher::new(&api).fetch("notitle").is_none());
    }

    #[test]
    fn unparseable_count_is_absent() {
        let mut value = video_value("odd", "Chan", 5, "PT1S");
        value["statistics"]["likeCount"] = json!("many");
        let api = FakePlatformApi::new().with_video("odd", value);
        assert!(VideoStatsFetcher::new(&api).fetch("odd").is_none());
    }

    #[test]
    fn transport_failure_is_absent() {
        let mut api = FakePlatformApi::new().with_video("slow", video_value("slow", "Chan", 1, "PT1S"));
        api.fail_videos.insert("slow".into());
        assert!(VideoStatsFetcher::new(&api).fetch("slow").is_none());
    }
}
