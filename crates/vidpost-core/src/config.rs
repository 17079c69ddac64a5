//! Configuration module
//!
//! Runtime settings for the ingestion daemon. Everything is read from the
//! process environment (after loading an optional `.env` file); the token and
//! the API base URL are mandatory and checked at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Directory watched when `VIDEOS_DIR` is not set.
pub const DEFAULT_VIDEOS_DIR: &str = "./videos";

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!(
                "VIDPOST_LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            )),
        }
    }
}

/// Ingestion configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Base URL of the content service, without a trailing slash.
    pub api_base_url: String,
    /// Value sent in the `Flic-Token` header.
    pub token: String,
    /// Directory watched for new videos.
    pub videos_dir: PathBuf,
    /// Per-request HTTP timeout. `None` lets a hung endpoint stall only its own task.
    pub http_timeout: Option<Duration>,
    /// Log the locally computed SHA-256 of each file before upload.
    pub log_local_digest: bool,
    pub log_format: LogFormat,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("FLIC_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("FLIC_API_URL must be set to the content service base URL"))?;

        let token = lookup("FLIC_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("FLIC_TOKEN must be set for authentication"))?;

        let videos_dir = lookup("VIDEOS_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEOS_DIR.to_string());

        let http_timeout = match lookup("VIDPOST_HTTP_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("VIDPOST_HTTP_TIMEOUT_SECS must be a whole number of seconds")
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            _ => None,
        };

        let log_local_digest = lookup("VIDPOST_LOG_LOCAL_DIGEST")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let log_format = match lookup("VIDPOST_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        let config = IngestConfig {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            videos_dir: PathBuf::from(videos_dir),
            http_timeout,
            log_local_digest,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.token.is_empty() {
            return Err(anyhow::anyhow!("FLIC_TOKEN must not be empty"));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "FLIC_API_URL must be an http:// or https:// URL, got '{}'",
                self.api_base_url
            ));
        }

        Ok(())
    }
}
