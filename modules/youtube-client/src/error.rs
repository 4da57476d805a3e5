use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Missing YOUTUBE_API_KEY")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("YouTube API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl YouTubeError {
    /// Network failures, throttling and server errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            YouTubeError::Network(_) => true,
            YouTubeError::Api { status, .. } => *status == 429 || *status >= 500,
            YouTubeError::MissingApiKey | YouTubeError::Config(_) | YouTubeError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::Parse(err.to_string())
    }
}
