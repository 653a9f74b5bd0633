//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling cadence and cycle behavior
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Catalog persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read API server
    #[serde(default)]
    pub server: ServerConfig,

    /// Source definitions
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.interval_minutes == 0 {
            return Err(AppError::validation(
                "scheduler.interval_minutes must be > 0",
            ));
        }
        if self.scheduler.max_concurrent == 0 {
            return Err(AppError::validation("scheduler.max_concurrent must be > 0"));
        }
        if self.scheduler.source_timeout_secs == 0 {
            return Err(AppError::validation(
                "scheduler.source_timeout_secs must be > 0",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.path is empty"));
        }
        if self.server.bind_addr.trim().is_empty() {
            return Err(AppError::validation("server.bind_addr is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        Ok(())
    }

    /// Sources that are enabled for polling.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            http: HttpConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// Polling cadence and cycle behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes between polling cycles
    #[serde(default = "defaults::interval_minutes")]
    pub interval_minutes: u64,

    /// Run one cycle immediately on startup, before the periodic trigger
    #[serde(default = "defaults::run_on_start")]
    pub run_on_start: bool,

    /// Overall deadline for a single source poll, in seconds
    #[serde(default = "defaults::source_timeout")]
    pub source_timeout_secs: u64,

    /// Maximum sources polled concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: defaults::interval_minutes(),
            run_on_start: defaults::run_on_start(),
            source_timeout_secs: defaults::source_timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between paged requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Catalog persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the catalog snapshot file
    #[serde(default = "defaults::storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::storage_path(),
        }
    }
}

/// Read API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API server binds to
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
        }
    }
}

/// Which extraction style a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Greenhouse job-board JSON API
    Greenhouse,

    /// Lever postings JSON API
    Lever,

    /// HTML careers page parsed with configured selectors
    Board,
}

/// One external source to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name; becomes the id prefix of every posting it yields
    pub name: String,

    /// Extraction style
    pub kind: SourceKind,

    /// Greenhouse board token (kind = "greenhouse")
    #[serde(default)]
    pub board_token: Option<String>,

    /// Lever site handle (kind = "lever")
    #[serde(default)]
    pub site: Option<String>,

    /// Careers page URL (kind = "board")
    #[serde(default)]
    pub url: Option<String>,

    /// Keep only observations whose title contains one of these words
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Whether the source participates in polling
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Row extraction selectors (kind = "board")
    #[serde(default)]
    pub selectors: Option<BoardSelectors>,
}

impl SourceConfig {
    /// Validate the source definition, including kind-specific fields.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("source name is empty"));
        }
        // Names feed posting ids as `<name>:<slug>`, so keep them lowercase
        // and free of the separator.
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(AppError::validation(format!(
                "source name '{}' must be lowercase alphanumeric with '-' or '_'",
                self.name
            )));
        }
        match self.kind {
            SourceKind::Greenhouse => {
                if self
                    .board_token
                    .as_deref()
                    .is_none_or(|t| t.trim().is_empty())
                {
                    return Err(AppError::validation(format!(
                        "source '{}': greenhouse sources need board_token",
                        self.name
                    )));
                }
            }
            SourceKind::Lever => {
                if self.site.as_deref().is_none_or(|s| s.trim().is_empty()) {
                    return Err(AppError::validation(format!(
                        "source '{}': lever sources need site",
                        self.name
                    )));
                }
            }
            SourceKind::Board => {
                if self.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    return Err(AppError::validation(format!(
                        "source '{}': board sources need url",
                        self.name
                    )));
                }
                if self.selectors.is_none() {
                    return Err(AppError::validation(format!(
                        "source '{}': board sources need [sources.selectors]",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// CSS selectors for extracting listing rows from an HTML board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSelectors {
    /// Selector matching one listing row
    pub row: String,

    /// Selector for the title element within a row
    pub title: String,

    /// Selector matching the listings container. When it matches but no row
    /// does, the board is treated as legitimately empty; without it, an
    /// empty first page fails the poll as a parse error.
    #[serde(default)]
    pub container: Option<String>,

    /// Selector for the link element; defaults to the title element
    #[serde(default)]
    pub link: Option<String>,

    /// Selector for the location element
    #[serde(default)]
    pub location: Option<String>,

    /// Selector for the team/department element
    #[serde(default)]
    pub team: Option<String>,

    /// Attribute holding the link target
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,

    /// Query parameter used for page numbers, when the board paginates
    #[serde(default)]
    pub page_param: Option<String>,

    /// Upper bound on pages fetched per poll
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

mod defaults {
    use super::{SourceConfig, SourceKind};
    use std::path::PathBuf;

    // Scheduler defaults
    pub fn interval_minutes() -> u64 {
        60
    }
    pub fn run_on_start() -> bool {
        true
    }
    pub fn source_timeout() -> u64 {
        120
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }

    // Storage defaults
    pub fn storage_path() -> PathBuf {
        PathBuf::from("data/catalog.json")
    }

    // Server defaults
    pub fn bind_addr() -> String {
        "127.0.0.1:8080".into()
    }

    // Source defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn link_attr() -> String {
        "href".into()
    }
    pub fn max_pages() -> u32 {
        5
    }

    pub fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                name: "ramp".to_string(),
                kind: SourceKind::Greenhouse,
                board_token: Some("ramp".to_string()),
                site: None,
                url: None,
                keywords: vec!["intern".to_string(), "internship".to_string()],
                enabled: true,
                selectors: None,
            },
            SourceConfig {
                name: "palantir".to_string(),
                kind: SourceKind::Lever,
                board_token: None,
                site: Some("palantir".to_string()),
                url: None,
                keywords: vec!["intern".to_string(), "internship".to_string()],
                enabled: true,
                selectors: None,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.scheduler.interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.scheduler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut config = Config::default();
        let clone = config.sources[0].clone();
        config.sources.push(clone);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_separator_in_name() {
        let mut config = Config::default();
        config.sources[0].name = "acme:jobs".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_greenhouse_without_token() {
        let mut config = Config::default();
        config.sources[0].board_token = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [[sources]]
            name = "acme"
            kind = "greenhouse"
            board_token = "acme"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.interval_minutes, 60);
        assert_eq!(config.sources.len(), 1);
        assert!(config.sources[0].enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_board_source_with_selectors() {
        let config: Config = toml::from_str(
            r#"
            [[sources]]
            name = "acme"
            kind = "board"
            url = "https://careers.acme.com/openings"
            keywords = ["intern"]

            [sources.selectors]
            row = "ul.jobs li"
            title = "a.job-title"
            location = "span.location"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        let selectors = config.sources[0].selectors.as_ref().unwrap();
        assert_eq!(selectors.link_attr, "href");
        assert_eq!(selectors.max_pages, 5);
    }

    #[test]
    fn disabled_sources_are_filtered() {
        let mut config = Config::default();
        config.sources[1].enabled = false;
        let enabled: Vec<_> = config.enabled_sources().map(|s| s.name.as_str()).collect();
        assert_eq!(enabled, vec!["ramp"]);
    }
}
