#![forbid(unsafe_code)]

//! JSON API over the channel analytics pipeline.
//!
//! Every request goes to YouTube: nothing is cached or stored. The library
//! is blocking, so each handler hands its acquisition to tokio's blocking
//! pool and only awaits the result.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path as AxumPath, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info, warn};
use tubestats_tools::api::{HttpPlatformApi, PlatformApi};
use tubestats_tools::comments::{CommentFetcher, VideoComment};
use tubestats_tools::config::{RuntimeOverrides, resolve_runtime_settings};
use tubestats_tools::dataset::{AnalysisRow, DEFAULT_MAX_RESULTS, DatasetMerger};
use tubestats_tools::duration::parse_duration;
use tubestats_tools::error::{AcquisitionError, ApiError as UpstreamError, SentimentError};
use tubestats_tools::logging::init_logging;
use tubestats_tools::sentiment::{
    ClassifiedComment, HttpSentimentClassifier, SentimentClassifier, SentimentSummary,
    classify_comments,
};
use tubestats_tools::stats::{VideoStats, VideoStatsFetcher};

/// Upper bound on `max_results` so one request cannot walk a whole catalogue.
const MAX_RESULTS_LIMIT: usize = 500;
const DEFAULT_COMMENT_LIMIT: usize = 100;
const MAX_COMMENT_LIMIT: usize = 1000;

type SharedApi = Arc<dyn PlatformApi + Send + Sync>;
type SharedClassifier = Arc<dyn SentimentClassifier + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "backend", about = "Serve channel analytics as JSON")]
struct BackendArgs {
    /// Listen address, overrides TUBESTATS_HOST.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Listen port, overrides TUBESTATS_PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Alternate `.env` file.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn parse_host_arg(value: &str) -> Result<IpAddr> {
    value
        .parse::<IpAddr>()
        .context("expected a valid IPv4 or IPv6 address for --host/TUBESTATS_HOST")
}

#[derive(Clone)]
struct AppState {
    api: SharedApi,
    /// `None` when no classifier endpoint is configured.
    classifier: Option<SharedClassifier>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<AcquisitionError> for ApiError {
    fn from(err: AcquisitionError) -> Self {
        match err {
            AcquisitionError::ChannelNotFound(title) => {
                ApiError::not_found(format!("channel not found: {title}"))
            }
            AcquisitionError::Transport(err) => err.into(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        warn!(error = %err, "upstream request failed");
        ApiError::bad_gateway(err.to_string())
    }
}

impl From<SentimentError> for ApiError {
    fn from(err: SentimentError) -> Self {
        warn!(error = %err, "sentiment classification failed");
        ApiError::bad_gateway(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = BackendArgs::parse();

    let settings = resolve_runtime_settings(RuntimeOverrides {
        tubestats_port: args.port,
        tubestats_host: args.host.map(|host| host.to_string()),
        env_path: args.env_file,
        ..RuntimeOverrides::default()
    })?;
    let host = parse_host_arg(&settings.tubestats_host)?;

    let classifier = settings.sentiment_url.clone().map(|url| {
        Arc::new(HttpSentimentClassifier::new(
            url,
            settings.sentiment_token.clone(),
            settings.http_timeout,
        )
        .with_label_scheme(settings.sentiment_label_scheme)) as SharedClassifier
    });
    if classifier.is_none() {
        info!("SENTIMENT_API_URL not set; sentiment requests will be rejected");
    }

    let state = AppState {
        api: Arc::new(HttpPlatformApi::from_settings(&settings)),
        classifier,
    };

    let addr = SocketAddr::new(host, settings.tubestats_port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!(%addr, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/channels/{title}/videos", get(list_channel_videos))
        .route("/api/videos/{id}", get(get_video))
        .route("/api/videos/{id}/comments", get(get_video_comments))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {err}");
    }
    info!("shutting down");
}

/// Runs blocking pipeline work off the async executor.
async fn run_blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ApiError::internal(format!("background task failed: {err}")))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
struct ChannelVideosQuery {
    max_results: Option<usize>,
}

async fn list_channel_videos(
    State(state): State<AppState>,
    AxumPath(title): AxumPath<String>,
    query: Result<Query<ChannelVideosQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AnalysisRow>>> {
    let Query(query) = query?;
    let max_results = query
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .min(MAX_RESULTS_LIMIT);
    let api = state.api.clone();
    let records =
        run_blocking(move || DatasetMerger::new(api.as_ref()).merge(&title, max_results))
            .await??;
    Ok(Json(records.into_iter().map(AnalysisRow::from).collect()))
}

#[derive(Debug, Serialize)]
struct VideoDetails {
    #[serde(flatten)]
    stats: VideoStats,
    duration_sec: Option<u64>,
}

async fn get_video(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<VideoDetails>> {
    let api = state.api.clone();
    let lookup_id = id.clone();
    let stats = run_blocking(move || VideoStatsFetcher::new(api.as_ref()).fetch(&lookup_id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video not found: {id}")))?;
    let duration_sec = parse_duration(&stats.duration);
    Ok(Json(VideoDetails {
        stats,
        duration_sec,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct CommentsQuery {
    limit: Option<usize>,
    #[serde(default)]
    sentiment: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CommentList {
    Plain(Vec<VideoComment>),
    Classified(Vec<ClassifiedComment>),
}

#[derive(Debug, Serialize)]
struct CommentsResponse {
    video_id: String,
    count: usize,
    comments: CommentList,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SentimentSummary>,
}

async fn get_video_comments(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    query: Result<Query<CommentsQuery>, QueryRejection>,
) -> ApiResult<Json<CommentsResponse>> {
    let Query(query) = query?;
    let classifier = if query.sentiment {
        let Some(classifier) = state.classifier.clone() else {
            return Err(ApiError::internal(
                "sentiment classification is not configured (SENTIMENT_API_URL)",
            ));
        };
        Some(classifier)
    } else {
        None
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_COMMENT_LIMIT)
        .min(MAX_COMMENT_LIMIT);
    let api = state.api.clone();
    let video_id = id.clone();
    let comments =
        run_blocking(move || CommentFetcher::new(api.as_ref()).fetch(&video_id, Some(limit)))
            .await??;
    let count = comments.len();

    let Some(classifier) = classifier else {
        return Ok(Json(CommentsResponse {
            video_id: id,
            count,
            comments: CommentList::Plain(comments),
            summary: None,
        }));
    };

    let classified =
        run_blocking(move || classify_comments(classifier.as_ref(), comments)).await??;
    let summary = SentimentSummary::from_sentiments(classified.iter().map(|c| c.sentiment));
    Ok(Json(CommentsResponse {
        video_id: id,
        count,
        comments: CommentList::Classified(classified),
        summary: Some(summary),
    }))
}
