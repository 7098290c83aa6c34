#![forbid(unsafe_code)]

//! Command-line report over a channel's uploads or one video's comments.
//!
//! Reports go to stdout (a plain table or JSON); diagnostics go through
//! tracing to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tubestats_tools::api::HttpPlatformApi;
use tubestats_tools::comments::{CommentFetcher, VideoComment};
use tubestats_tools::config::{RuntimeOverrides, RuntimeSettings, resolve_runtime_settings};
use tubestats_tools::dataset::{AnalysisRow, DEFAULT_MAX_RESULTS, DatasetMerger};
use tubestats_tools::duration::format_duration;
use tubestats_tools::logging::init_logging;
use tubestats_tools::sentiment::{
    ClassifiedComment, HttpSentimentClassifier, SentimentSummary, classify_comments,
};

const TITLE_WIDTH: usize = 48;
const COMMENT_WIDTH: usize = 72;

#[derive(Debug, Parser)]
#[command(name = "channel_report", version, about = "YouTube channel analytics")]
struct Cli {
    /// Alternate `.env` file.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge a channel's latest uploads with their statistics.
    Videos(VideosArgs),
    /// Fetch a video's top-level comments, optionally with sentiment.
    Comments(CommentsArgs),
}

#[derive(Debug, Args)]
struct VideosArgs {
    /// Channel title as typed into YouTube search.
    channel_title: String,

    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CommentsArgs {
    video_id: String,

    /// Stop after this many comments.
    #[arg(long)]
    limit: Option<usize>,

    /// Classify comments through SENTIMENT_API_URL.
    #[arg(long)]
    sentiment: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = resolve_runtime_settings(RuntimeOverrides {
        env_path: cli.env_file.clone(),
        ..RuntimeOverrides::default()
    })?;
    let api = HttpPlatformApi::from_settings(&settings);

    let output = match cli.command {
        Command::Videos(args) => run_videos(&api, &args)?,
        Command::Comments(args) => run_comments(&api, &settings, &args)?,
    };
    println!("{output}");
    Ok(())
}

fn run_videos(api: &HttpPlatformApi, args: &VideosArgs) -> Result<String> {
    let records = DatasetMerger::new(api)
        .merge(&args.channel_title, args.max_results)
        .with_context(|| format!("building dataset for {}", args.channel_title))?;
    info!(channel = %args.channel_title, rows = records.len(), "dataset ready");

    let rows: Vec<AnalysisRow> = records.into_iter().map(AnalysisRow::from).collect();
    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => Ok(render_video_table(&rows)),
    }
}

fn run_comments(
    api: &HttpPlatformApi,
    settings: &RuntimeSettings,
    args: &CommentsArgs,
) -> Result<String> {
    let classifier = if args.sentiment {
        let Some(url) = settings.sentiment_url.clone() else {
            bail!("--sentiment requires SENTIMENT_API_URL to be set");
        };
        Some(HttpSentimentClassifier::new(
            url,
            settings.sentiment_token.clone(),
            settings.http_timeout,
        )
        .with_label_scheme(settings.sentiment_label_scheme))
    } else {
        None
    };

    let comments = CommentFetcher::new(api)
        .fetch(&args.video_id, args.limit)
        .with_context(|| format!("fetching comments for {}", args.video_id))?;

    let Some(classifier) = classifier else {
        return match args.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&comments)?),
            OutputFormat::Table => Ok(render_comment_table(&comments)),
        };
    };

    let classified =
        classify_comments(&classifier, comments).context("classifying comment sentiment")?;
    let summary = SentimentSummary::from_sentiments(classified.iter().map(|c| c.sentiment));
    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "comments": classified,
            "summary": summary,
        }))?),
        OutputFormat::Table => Ok(render_sentiment_table(&classified, &summary)),
    }
}

/// `2024-03-02T08:30:00Z` → `2024-03-02`; anything unparseable is shown as-is.
fn display_date(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn truncate(value: &str, width: usize) -> String {
    let single_line = value.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn render_video_table(rows: &[AnalysisRow]) -> String {
    if rows.is_empty() {
        return "no videos found".to_string();
    }

    let mut lines = vec![format!(
        "{:<TITLE_WIDTH$}  {:<10}  {:>12}  {:>10}  {:>9}  {:>9}",
        "title", "published", "views", "likes", "comments", "duration"
    )];
    for row in rows {
        let record = &row.record;
        let duration = row
            .duration_sec
            .map(format_duration)
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!(
            "{:<TITLE_WIDTH$}  {:<10}  {:>12}  {:>10}  {:>9}  {:>9}",
            truncate(&record.title, TITLE_WIDTH),
            display_date(&record.published_at),
            record.view_count,
            record.like_count,
            record.comment_count,
            duration,
        ));
    }
    lines.join("\n")
}

fn render_comment_table(comments: &[VideoComment]) -> String {
    if comments.is_empty() {
        return "no comments found".to_string();
    }

    comments
        .iter()
        .map(|comment| {
            format!(
                "{:>6}  {:<24}  {}",
                comment.likes,
                truncate(&comment.author, 24),
                truncate(&comment.text, COMMENT_WIDTH)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sentiment_table(comments: &[ClassifiedComment], summary: &SentimentSummary) -> String {
    let mut lines: Vec<String> = comments
        .iter()
        .map(|entry| {
            let label = serde_json::to_value(entry.sentiment)
                .ok()
                .and_then(|value| value.as_str().map(str::to_owned))
                .unwrap_or_default();
            format!(
                "{:<8}  {:>5.2}  {:<24}  {}",
                label,
                entry.score,
                truncate(&entry.comment.author, 24),
                truncate(&entry.comment.text, COMMENT_WIDTH)
            )
        })
        .collect();
    lines.push(format!(
        "positive {}  neutral {}  negative {}  unknown {}  (total {})",
        summary.positive,
        summary.neutral,
        summary.negative,
        summary.unknown,
        summary.total()
    ));
    lines.join("\n")
}
