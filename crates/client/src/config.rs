//! Client configuration from the environment.
//!
//! | variable                     | default                               |
//! |------------------------------|---------------------------------------|
//! | `TELLMEMO_API_URL`           | `http://localhost:8000`               |
//! | `TELLMEMO_WS_URL`            | API url with `ws(s)://` + `/ws/jobs`  |
//! | `TELLMEMO_JOB_EVICTION_SECS` | `15`                                  |
//! | `TELLMEMO_EXPORT_DIR`        | OS download directory                 |
//! | `TELLMEMO_LOG_FORMAT`        | `json` (`json` or `pretty`)           |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use tellmemo_observability::{LogFormat, ParseLogFormatError};

use crate::jobs::{DEFAULT_EVICTION_DELAY, TrackerConfig};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be a {expected} URL, got {value:?}")]
    InvalidUrl { key: &'static str, expected: &'static str, value: String },
    #[error(transparent)]
    InvalidLogFormat(#[from] ParseLogFormatError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub ws_url: String,
    pub job_eviction_delay: Duration,
    pub export_dir: PathBuf,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Read the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = match get("TELLMEMO_API_URL") {
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidUrl {
                        key: "TELLMEMO_API_URL",
                        expected: "http(s)",
                        value: url,
                    });
                }
                url.trim_end_matches('/').to_string()
            }
            None => {
                tracing::warn!("TELLMEMO_API_URL not set; using {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            }
        };

        let ws_url = match get("TELLMEMO_WS_URL") {
            Some(url) => {
                if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                    return Err(ConfigError::InvalidUrl {
                        key: "TELLMEMO_WS_URL",
                        expected: "ws(s)",
                        value: url,
                    });
                }
                url
            }
            None => jobs_socket_url(&api_url),
        };

        let job_eviction_delay = match get("TELLMEMO_JOB_EVICTION_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber { key: "TELLMEMO_JOB_EVICTION_SECS", value: raw })?,
            None => DEFAULT_EVICTION_DELAY,
        };

        let export_dir = match get("TELLMEMO_EXPORT_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_export_dir(),
        };

        let log_format = match get("TELLMEMO_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self { api_url, ws_url, job_eviction_delay, export_dir, log_format })
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig { eviction_delay: self.job_eviction_delay }
    }
}

/// `http://host/api` → `ws://host/api/ws/jobs`.
fn jobs_socket_url(api_url: &str) -> String {
    let rest = api_url
        .strip_prefix("https://")
        .map(|r| format!("wss://{r}"))
        .or_else(|| api_url.strip_prefix("http://").map(|r| format!("ws://{r}")))
        .unwrap_or_else(|| api_url.to_string());
    format!("{rest}/ws/jobs")
}

/// `{downloads}` if the OS has one, else `{home}/Downloads`, else the cwd.
fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
