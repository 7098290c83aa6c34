//! Comment sentiment via an external text-classification service.
//!
//! The model itself lives elsewhere. This module only defines the seam
//! (`SentimentClassifier`), normalizes the labels different models emit, and
//! summarizes results per video.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::comments::VideoComment;
use crate::error::{ApiError, SentimentError};

/// Raw classifier output for one input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

/// How bare `LABEL_n` outputs are read. Named labels are unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelScheme {
    /// `LABEL_0..2`: negative, neutral, positive.
    #[default]
    ThreeClass,
    /// `LABEL_0..1`: negative, positive.
    TwoClass,
}

impl LabelScheme {
    pub fn from_class_count(count: u8) -> Option<Self> {
        match count {
            2 => Some(LabelScheme::TwoClass),
            3 => Some(LabelScheme::ThreeClass),
            _ => None,
        }
    }
}

impl Sentiment {
    /// Maps model-specific labels case-insensitively: `POSITIVE`/`pos`,
    /// `LABEL_0..2` (negative, neutral, positive) and `1 star`..`5 stars`.
    pub fn from_label(label: &str) -> Self {
        Self::from_label_with(label, LabelScheme::ThreeClass)
    }

    pub fn from_label_with(label: &str, scheme: LabelScheme) -> Self {
        let label = label.trim().to_ascii_lowercase();

        match (label.as_str(), scheme) {
            ("label_0", _) => return Sentiment::Negative,
            ("label_1", LabelScheme::ThreeClass) => return Sentiment::Neutral,
            ("label_1", LabelScheme::TwoClass) => return Sentiment::Positive,
            ("label_2", LabelScheme::ThreeClass) => return Sentiment::Positive,
            ("label_2", LabelScheme::TwoClass) => return Sentiment::Unknown,
            _ => {}
        }

        if let Some(stars) = label
            .strip_suffix(" stars")
            .or_else(|| label.strip_suffix(" star"))
            .and_then(|stars| stars.trim().parse::<u8>().ok())
        {
            return match stars {
                1 | 2 => Sentiment::Negative,
                3 => Sentiment::Neutral,
                4 | 5 => Sentiment::Positive,
                _ => Sentiment::Unknown,
            };
        }

        if label.contains("neg") {
            Sentiment::Negative
        } else if label.contains("neu") {
            Sentiment::Neutral
        } else if label.contains("pos") {
            Sentiment::Positive
        } else {
            Sentiment::Unknown
        }
    }
}

/// Classifies a batch of texts, one score per input in input order.
pub trait SentimentClassifier {
    fn classify(&self, texts: &[String]) -> Result<Vec<SentimentScore>, SentimentError>;

    /// Convention the model's bare `LABEL_n` outputs follow.
    fn label_scheme(&self) -> LabelScheme {
        LabelScheme::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedComment {
    #[serde(flatten)]
    pub comment: VideoComment,
    pub sentiment: Sentiment,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub unknown: usize,
}

impl SentimentSummary {
    pub fn from_sentiments(sentiments: impl IntoIterator<Item = Sentiment>) -> Self {
        let mut summary = Self::default();
        for sentiment in sentiments {
            match sentiment {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Neutral => summary.neutral += 1,
                Sentiment::Negative => summary.negative += 1,
                Sentiment::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative + self.unknown
    }
}

/// Pairs every comment with its label. No request is made for an empty slice.
pub fn classify_comments<C: SentimentClassifier + ?Sized>(
    classifier: &C,
    comments: Vec<VideoComment>,
) -> Result<Vec<ClassifiedComment>, SentimentError> {
    if comments.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = comments.iter().map(|comment| comment.text.clone()).collect();
    let scores = classifier.classify(&texts)?;
    let scheme = classifier.label_scheme();
    if scores.len() != comments.len() {
        return Err(SentimentError::LengthMismatch {
            expected: comments.len(),
            got: scores.len(),
        });
    }

    Ok(comments
        .into_iter()
        .zip(scores)
        .map(|(comment, score)| ClassifiedComment {
            comment,
            sentiment: Sentiment::from_label_with(&score.label, scheme),
            score: score.score,
        })
        .collect())
}

/// Inference endpoints answer either with every label ranked per input or
/// with the single best label per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierOutput {
    Ranked(Vec<Vec<SentimentScore>>),
    Flat(Vec<SentimentScore>),
}

impl ClassifierOutput {
    fn into_top_scores(self) -> Result<Vec<SentimentScore>, ApiError> {
        match self {
            ClassifierOutput::Flat(scores) => Ok(scores),
            ClassifierOutput::Ranked(ranked) => ranked
                .into_iter()
                .map(|candidates| {
                    candidates
                        .into_iter()
                        .max_by(|a, b| a.score.total_cmp(&b.score))
                        .ok_or_else(|| ApiError::Decode("empty label list for an input".into()))
                })
                .collect(),
        }
    }
}

/// Posts `{"inputs": [...]}` to a hosted text-classification endpoint.
#[derive(Clone)]
pub struct HttpSentimentClassifier {
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
    label_scheme: LabelScheme,
}

impl HttpSentimentClassifier {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            url: url.into(),
            token,
            label_scheme: LabelScheme::default(),
        }
    }

    pub fn with_label_scheme(mut self, label_scheme: LabelScheme) -> Self {
        self.label_scheme = label_scheme;
        self
    }
}

impl SentimentClassifier for HttpSentimentClassifier {
    fn classify(&self, texts: &[String]) -> Result<Vec<SentimentScore>, SentimentError> {
        debug!(url = %self.url, inputs = texts.len(), "requesting sentiment labels");
        let mut request = self.agent.post(&self.url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = request
            .send_json(json!({ "inputs": texts }))
            .map_err(ApiError::from)?;
        let output: ClassifierOutput = response
            .into_json()
            .map_err(|err| ApiError::Decode(format!("sentiment response: {err}")))?;
        Ok(output.into_top_scores()?)
    }

    fn label_scheme(&self) -> LabelScheme {
        self.label_scheme
    }
}
