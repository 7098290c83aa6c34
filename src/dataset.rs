//! Listing + per-video stats joined into one analysis-ready table.
//!
//! The join is an explicit inner join on `video_id`: uploads whose stats
//! lookup came back empty are dropped. `merge_with_report` exposes the
//! dropped ids so callers can tell "fewer videos" apart from "lost rows".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::PlatformApi;
use crate::duration::parse_duration;
use crate::error::AcquisitionError;
use crate::lister::{ChannelVideoLister, VideoSummary};
use crate::stats::{VideoStats, VideoStatsFetcher};

/// Number of uploads analysed when the caller does not say otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One row of the merged dataset. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub description: String,
    pub channel_name: String,
    pub publication_date: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub duration: String,
}

impl MergedRecord {
    pub const COLUMNS: [&'static str; 10] = [
        "video_id",
        "title",
        "published_at",
        "description",
        "channel_name",
        "publication_date",
        "view_count",
        "like_count",
        "comment_count",
        "duration",
    ];

    /// The listing's `title`/`description` win; the stats copies are dropped.
    pub fn join(summary: VideoSummary, stats: VideoStats) -> Self {
        Self {
            video_id: summary.video_id,
            title: summary.title,
            published_at: summary.published_at,
            description: summary.description,
            channel_name: stats.channel_name,
            publication_date: stats.publication_date,
            view_count: stats.view_count,
            like_count: stats.like_count,
            comment_count: stats.comment_count,
            duration: stats.duration,
        }
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        parse_duration(&self.duration)
    }
}

/// A merged record plus the derived `duration_sec` column consumers chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRow {
    #[serde(flatten)]
    pub record: MergedRecord,
    pub duration_sec: Option<u64>,
}

impl From<MergedRecord> for AnalysisRow {
    fn from(record: MergedRecord) -> Self {
        let duration_sec = record.duration_seconds();
        Self {
            record,
            duration_sec,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub records: Vec<MergedRecord>,
    /// Listed ids that had no stats and were dropped by the join.
    pub missing_stats: Vec<String>,
}

/// Inner join on `video_id`, keeping the order of `videos`.
pub fn inner_join(videos: Vec<VideoSummary>, stats: Vec<VideoStats>) -> MergeOutcome {
    let mut by_id: HashMap<String, VideoStats> = stats
        .into_iter()
        .map(|stats| (stats.video_id.clone(), stats))
        .collect();

    let mut outcome = MergeOutcome::default();
    for summary in videos {
        match by_id.remove(&summary.video_id) {
            Some(stats) => outcome.records.push(MergedRecord::join(summary, stats)),
            None => outcome.missing_stats.push(summary.video_id),
        }
    }
    outcome
}

pub struct DatasetMerger<'a, A: ?Sized> {
    lister: ChannelVideoLister<'a, A>,
    fetcher: VideoStatsFetcher<'a, A>,
}

impl<'a, A: PlatformApi + ?Sized> DatasetMerger<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            lister: ChannelVideoLister::new(api),
            fetcher: VideoStatsFetcher::new(api),
        }
    }

    /// Rebuilds the dataset for `channel_title` from scratch.
    pub fn merge(
        &self,
        channel_title: &str,
        max_results: usize,
    ) -> Result<Vec<MergedRecord>, AcquisitionError> {
        Ok(self.merge_with_report(channel_title, max_results)?.records)
    }

    pub fn merge_with_report(
        &self,
        channel_title: &str,
        max_results: usize,
    ) -> Result<MergeOutcome, AcquisitionError> {
        let videos = self.lister.list(channel_title, Some(max_results))?;
        if videos.is_empty() {
            return Ok(MergeOutcome::default());
        }

        let stats: Vec<VideoStats> = videos
            .iter()
            .filter_map(|video| self.fetcher.fetch(&video.video_id))
            .collect();

        let listed = videos.len();
        let outcome = inner_join(videos, stats);
        if !outcome.missing_stats.is_empty() {
            warn!(
                channel = channel_title,
                dropped = outcome.missing_stats.len(),
                ids = ?outcome.missing_stats,
                "videos without statistics were dropped from the dataset"
            );
        }
        info!(
            channel = channel_title,
            listed,
            merged = outcome.records.len(),
            "merged channel dataset"
        );

        Ok(outcome)
    }
}
