//! Error types shared by the acquisition pipeline and the HTTP clients.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure talking to an upstream HTTP service (YouTube or the classifier).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                ApiError::Status {
                    status,
                    message: upstream_error_message(&body),
                }
            }
            ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
        }
    }
}

/// Pulls `error.message` out of a Google-style error envelope, falling back
/// to the raw body.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

/// Conditions the caller of the acquisition pipeline can branch on.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error(transparent)]
    Transport(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("sentiment service failed: {0}")]
    Transport(#[from] ApiError),

    #[error("sentiment service returned {got} results for {expected} inputs")]
    LengthMismatch { expected: usize, got: usize },
}
