//! Configuration types for icon-dl
//!
//! A configuration is a JSON document, by convention named
//! `configuration_<family>.json` for one icon family. Every field has a default,
//! so a file only needs the keys that differ. Keys this crate does not know
//! (browser settings such as `link_css` or `max_scrolls`) are ignored.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the numeric icon id in download URL templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Catalog and storage settings (what to download and where it goes)
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root directory for all per-icon folders (default: "icons")
    #[serde(default = "default_icon_dir")]
    pub icon_dir: PathBuf,

    /// Closed set of variant tags recognised in detail-page URLs (e.g. "thin", "bold")
    #[serde(default)]
    pub icon_types: Vec<String>,

    /// Prefix removed once from the front of every base name (e.g. "ph_")
    #[serde(default)]
    pub prefix_to_remove: String,

    /// Cache file holding detail-page URLs, one per line (default: "links.txt")
    #[serde(default = "default_links_file")]
    pub links_file: PathBuf,

    /// Catalog page scanned for detail-page links when the cache file is missing
    #[serde(default)]
    pub target_url: Option<String>,

    /// Regex an `href` must match to be collected from the catalog page
    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            icon_dir: default_icon_dir(),
            icon_types: Vec::new(),
            prefix_to_remove: String::new(),
            links_file: default_links_file(),
            target_url: None,
            link_pattern: default_link_pattern(),
        }
    }
}

/// HTTP download settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// URL template for the SVG download; `{id}` is replaced by the numeric id
    #[serde(default = "default_vector_url_template")]
    pub vector_url_template: String,

    /// URL template for the PNG download; `{id}` is replaced by the numeric id
    #[serde(default = "default_raster_url_template")]
    pub raster_url_template: String,

    /// Per-request timeout (default: 15 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            vector_url_template: default_vector_url_template(),
            raster_url_template: default_raster_url_template(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry policy for one asset
///
/// `max_attempts` counts every attempt, including the first one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per asset (default: 10)
    #[serde(default = "default_max_attempts", alias = "max_retries")]
    pub max_attempts: u32,

    /// Pause after the first failed attempt (default: 0 seconds)
    #[serde(default, with = "duration_serde")]
    pub initial_delay: Duration,

    /// Upper bound for the pause between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to pauses (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: Duration::ZERO,
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// How the next proxy is picked from the pool on rotation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxySelection {
    /// Uniformly random pick (default)
    #[default]
    Random,
    /// Walk the pool in order, wrapping around
    RoundRobin,
}

/// HTTP session identity settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Consecutive corrupted attempts that trigger a session rotation (default: 1)
    #[serde(default = "default_rotation_threshold")]
    pub rotation_threshold: u32,

    /// Proxy URLs to rotate through (empty = direct connection)
    #[serde(default)]
    pub proxies: Vec<String>,

    /// Proxy pick strategy
    #[serde(default)]
    pub proxy_selection: ProxySelection,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: default_rotation_threshold(),
            proxies: Vec::new(),
            proxy_selection: ProxySelection::default(),
        }
    }
}

/// Backoff applied when an endpoint answers HTTP 429
///
/// The pause is `base_delay` plus a uniform random extra in `[jitter_min, jitter_max]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Fixed part of the pause (default: 5 seconds)
    #[serde(default = "default_rate_limit_base", with = "duration_serde")]
    pub base_delay: Duration,

    /// Lower bound of the random extra (default: 2 seconds)
    #[serde(default = "default_rate_limit_jitter_min", with = "duration_serde")]
    pub jitter_min: Duration,

    /// Upper bound of the random extra (default: 3 seconds)
    #[serde(default = "default_rate_limit_jitter_max", with = "duration_serde")]
    pub jitter_max: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: default_rate_limit_base(),
            jitter_min: default_rate_limit_jitter_min(),
            jitter_max: default_rate_limit_jitter_max(),
        }
    }
}

/// Main configuration for [`IconDownloader`](crate::IconDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`catalog`](CatalogConfig) - icon root, variant tags, link source
/// - [`download`](DownloadConfig) - URL templates and request timeout
/// - [`retry`](RetryConfig) - attempts per asset
/// - [`session`](SessionConfig) - rotation threshold and proxy pool
/// - [`rate_limit`](RateLimitConfig) - HTTP 429 backoff
///
/// `catalog` and `download` are flattened, so their keys sit at the top level
/// of the JSON document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog and storage settings
    #[serde(flatten)]
    pub catalog: CatalogConfig,

    /// HTTP download settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Retry policy per asset
    #[serde(default)]
    pub retry: RetryConfig,

    /// Session rotation and proxies
    #[serde(default)]
    pub session: SessionConfig,

    /// Rate-limit backoff
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Path of the configuration file for an icon family: `configuration_<family>.json`
    pub fn family_path(family: &str) -> PathBuf {
        PathBuf::from(format!("configuration_{family}.json"))
    }

    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config {
                    message: format!("configuration file not found: {}", path.display()),
                    key: None,
                }
            } else {
                Error::Io(e)
            }
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Icon root directory
    pub fn icon_dir(&self) -> &Path {
        &self.catalog.icon_dir
    }

    /// Check settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "at least one attempt per asset is required",
                "retry.max_attempts",
            ));
        }
        if self.session.rotation_threshold == 0 {
            return Err(Error::config(
                "rotation threshold must be at least 1",
                "session.rotation_threshold",
            ));
        }
        for (key, template) in [
            ("vector_url_template", &self.download.vector_url_template),
            ("raster_url_template", &self.download.raster_url_template),
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(Error::config(
                    format!("template must contain {ID_PLACEHOLDER}: {template}"),
                    key,
                ));
            }
        }
        if self.catalog.icon_types.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::config("variant tags must not be empty", "icon_types"));
        }
        if self.rate_limit.jitter_min > self.rate_limit.jitter_max {
            return Err(Error::config(
                "jitter_min must not exceed jitter_max",
                "rate_limit.jitter_min",
            ));
        }
        regex::Regex::new(&self.catalog.link_pattern)
            .map_err(|e| Error::config(e.to_string(), "link_pattern"))?;
        for proxy in &self.session.proxies {
            reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| Error::config(format!("{proxy}: {e}"), "session.proxies"))?;
        }
        Ok(())
    }
}

fn default_icon_dir() -> PathBuf {
    PathBuf::from("icons")
}

fn default_links_file() -> PathBuf {
    PathBuf::from("links.txt")
}

fn default_link_pattern() -> String {
    r"/icons/\d+/".to_string()
}

fn default_vector_url_template() -> String {
    "https://www.iconfinder.com/icons/{id}/download/svg/4096".to_string()
}

fn default_raster_url_template() -> String {
    "https://www.iconfinder.com/icons/{id}/download/png/1024".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_rotation_threshold() -> u32 {
    1
}

fn default_rate_limit_base() -> Duration {
    Duration::from_secs(5)
}

fn default_rate_limit_jitter_min() -> Duration {
    Duration::from_secs(2)
}

fn default_rate_limit_jitter_max() -> Duration {
    Duration::from_secs(3)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
