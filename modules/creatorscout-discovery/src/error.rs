use std::fmt;

use thiserror::Error;

use creatorscout_common::ValidationError;

/// Pipeline stage an upstream failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    ChannelFetch,
    StoreCreate,
    StoreRead,
    StoreWrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Search => "search",
            Stage::ChannelFetch => "channel fetch",
            Stage::StoreCreate => "store create",
            Stage::StoreRead => "store read",
            Stage::StoreWrite => "store write",
        };
        f.write_str(name)
    }
}

/// A failed call to the video platform or the store.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub message: String,
    /// Network errors, throttling and 5xx. Only these are retried.
    pub transient: bool,
}

impl UpstreamError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }
}

impl From<youtube_client::YouTubeError> for UpstreamError {
    fn from(err: youtube_client::YouTubeError) -> Self {
        Self {
            transient: err.is_transient(),
            message: err.to_string(),
        }
    }
}

impl From<sheets_client::SheetsError> for UpstreamError {
    fn from(err: sheets_client::SheetsError) -> Self {
        Self {
            transient: err.is_transient(),
            message: err.to_string(),
        }
    }
}

/// Errors that abort a discovery run. AI failures never show up here;
/// the annotation stage absorbs them.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream {stage} failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: UpstreamError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV export failed: {0}")]
    Export(String),
}

impl DiscoveryError {
    pub fn upstream(stage: Stage) -> impl FnOnce(UpstreamError) -> Self {
        move |source| DiscoveryError::Upstream { stage, source }
    }
}
