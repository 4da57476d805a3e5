use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MINO_API_URL: &str = "https://api.mino.ai/v1/chat/completions";
pub const DEFAULT_MINO_MODEL: &str = "mino-latest";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Video platform
    pub youtube_api_key: String,

    // AI classifier
    pub mino_api_key: String,
    pub mino_api_url: String,
    pub mino_model: String,

    // Store. Optional so commands that never touch the store can run without it.
    pub google_access_token: Option<String>,

    // Pipeline tuning
    pub annotation_concurrency: usize,
    pub upstream_timeout: Duration,
    pub retry_attempts: u32,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            youtube_api_key: required_env("YOUTUBE_API_KEY")?,
            mino_api_key: required_env("MINO_API_KEY")?,
            mino_api_url: env::var("MINO_API_URL")
                .unwrap_or_else(|_| DEFAULT_MINO_API_URL.to_string()),
            mino_model: env::var("MINO_MODEL").unwrap_or_else(|_| DEFAULT_MINO_MODEL.to_string()),
            google_access_token: env::var("GOOGLE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            annotation_concurrency: parsed_env::<usize>("ANNOTATION_CONCURRENCY", 3)?.max(1),
            upstream_timeout: Duration::from_secs(parsed_env::<u64>("UPSTREAM_TIMEOUT_SECS", 30)?),
            retry_attempts: parsed_env::<u32>("RETRY_ATTEMPTS", 3)?.max(1),
        };

        Ok(config)
    }

    /// Log which keys are set without revealing them.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  YOUTUBE_API_KEY: {}", preview(&self.youtube_api_key));
        tracing::info!("  MINO_API_KEY: {}", preview(&self.mino_api_key));
        tracing::info!("  MINO_API_URL: {}", self.mino_api_url);
        tracing::info!("  MINO_MODEL: {}", self.mino_model);
        tracing::info!("  GOOGLE_ACCESS_TOKEN: {}", preview_opt(&self.google_access_token));
        tracing::info!(
            concurrency = self.annotation_concurrency,
            timeout_secs = self.upstream_timeout.as_secs(),
            retry_attempts = self.retry_attempts,
            "Pipeline settings"
        );
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parsed_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}
