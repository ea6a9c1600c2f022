//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calbridge/config.toml` by default. Nothing in it is written
//! back by the client; session state never touches disk.
//!
//! ```toml
//! [server]
//! origin = "http://localhost:3000"
//! backend_url = "http://localhost:8000"
//! timeout_secs = 10
//! max_pages = 1
//!
//! [display]
//! timezone = "Asia/Bangkok"
//! default_calendar = "primary"
//! attendee_preview = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calbridge_core::{DisplayZone, PRIMARY_CALENDAR, RangeError, RenderOptions};
use calbridge_protocol::DEFAULT_TIMEZONE;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Origin used when neither `backend_url` nor `origin` is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Configuration for the calbridge client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging, same as `--debug`.
    pub debug: bool,

    /// Backend connection settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Display settings.
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Frontend origin that proxies `/auth/*` and `/api/*`.
    pub origin: String,

    /// Direct backend base URL; takes precedence over `origin`.
    pub backend_url: Option<String>,

    /// Per-request timeout. Unset means the transport default.
    pub timeout_secs: Option<u64>,

    /// Event pages to follow per fetch.
    pub max_pages: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            backend_url: None,
            timeout_secs: None,
            max_pages: 1,
        }
    }
}

/// Display settings for rendered output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// IANA timezone for ranges and timestamps; unset or `local` means the
    /// machine's timezone.
    pub timezone: Option<String>,

    /// Calendar id that is not shown on event cards.
    pub default_calendar: String,

    /// Attendee names shown before "+N more".
    pub attendee_preview: usize,

    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            timezone: None,
            default_calendar: PRIMARY_CALENDAR.to_string(),
            attendee_preview: 3,
            max_title_length: None,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calbridge")
    }

    /// Replaces `backend_url` when an override is given.
    #[must_use]
    pub fn with_backend_url(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.server.backend_url = Some(url);
        }
        self
    }

    /// The base URL every request is joined to.
    pub fn base_url(&self) -> ClientResult<Url> {
        let raw = self
            .server
            .backend_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.server.origin);
        parse_base_url(raw)
    }

    /// Per-request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.server
            .timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    /// Pages to follow per fetch, at least one.
    pub fn max_pages(&self) -> u32 {
        self.server.max_pages.max(1)
    }

    /// The wall clock for ranges and timestamps.
    pub fn display_zone(&self) -> Result<DisplayZone, RangeError> {
        DisplayZone::parse(self.display.timezone.as_deref())
    }

    /// The `timezone` query value sent with event fetches.
    pub fn event_timezone(&self) -> Result<String, RangeError> {
        Ok(match self.display_zone()? {
            DisplayZone::Named(tz) => tz.name().to_string(),
            DisplayZone::Local => DEFAULT_TIMEZONE.to_string(),
        })
    }

    /// Render options derived from `[display]`.
    pub fn render_options(&self) -> Result<RenderOptions, RangeError> {
        Ok(RenderOptions {
            zone: self.display_zone()?,
            default_calendar: self.display.default_calendar.clone(),
            attendee_preview: self.display.attendee_preview,
            max_title_length: self.display.max_title_length,
        })
    }

    /// Checks every setting and returns a list of problems.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = parse_base_url(&self.server.origin) {
            problems.push(format!("server.origin: {}", e));
        }
        if let Some(ref backend_url) = self.server.backend_url {
            if let Err(e) = parse_base_url(backend_url) {
                problems.push(format!("server.backend_url: {}", e));
            }
        }
        if self.server.max_pages == 0 {
            problems.push("server.max_pages: must be at least 1".to_string());
        }
        if self.server.timeout_secs == Some(0) {
            problems.push("server.timeout_secs: must be greater than 0".to_string());
        }
        if let Err(e) = self.display_zone() {
            problems.push(format!("display.timezone: {}", e));
        }
        if self.display.default_calendar.trim().is_empty() {
            problems.push("display.default_calendar: must not be empty".to_string());
        }

        problems
    }
}

fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::Config(format!("invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "unsupported URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}
