// src/sources/mod.rs

//! Source adapters.
//!
//! One adapter per external source. Every `scrape` call returns a complete,
//! fresh snapshot of the source's current listings, or fails as a unit;
//! partial results are never returned, so a failure can always be told apart
//! from a legitimately empty board.

mod board;
mod greenhouse;
mod lever;

pub use board::BoardSource;
pub use greenhouse::GreenhouseSource;
pub use lever::LeverSource;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::canonical::title_matches_any;
use crate::error::{AppError, Result, ScrapeError};
use crate::models::{Config, HttpConfig, RawObservation, SourceConfig, SourceKind};

/// Contract for polling one external source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source name; prefixes every posting id this adapter yields.
    fn name(&self) -> &str;

    /// Fetch a complete snapshot of the source's current listings.
    ///
    /// Stateless across calls: the result must not depend on previous polls.
    async fn scrape(&self) -> std::result::Result<Vec<RawObservation>, ScrapeError>;
}

/// Create the HTTP client shared by all adapters.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Instantiate adapters for every enabled source in the configuration.
pub fn build_adapters(config: &Config, client: &Client) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    config
        .enabled_sources()
        .map(|source| build_adapter(source, client, &config.http))
        .collect()
}

fn build_adapter(
    source: &SourceConfig,
    client: &Client,
    http: &HttpConfig,
) -> Result<Arc<dyn SourceAdapter>> {
    let delay = Duration::from_millis(http.request_delay_ms);
    match source.kind {
        SourceKind::Greenhouse => {
            let token = source
                .board_token
                .clone()
                .ok_or_else(|| AppError::config(format!("source '{}' has no board_token", source.name)))?;
            Ok(Arc::new(GreenhouseSource::new(
                &source.name,
                token,
                source.keywords.clone(),
                client.clone(),
            )))
        }
        SourceKind::Lever => {
            let site = source
                .site
                .clone()
                .ok_or_else(|| AppError::config(format!("source '{}' has no site", source.name)))?;
            Ok(Arc::new(LeverSource::new(
                &source.name,
                site,
                source.keywords.clone(),
                client.clone(),
                delay,
            )))
        }
        SourceKind::Board => {
            let url = source
                .url
                .clone()
                .ok_or_else(|| AppError::config(format!("source '{}' has no url", source.name)))?;
            let selectors = source
                .selectors
                .clone()
                .ok_or_else(|| AppError::config(format!("source '{}' has no selectors", source.name)))?;
            Ok(Arc::new(BoardSource::new(
                &source.name,
                url,
                &selectors,
                source.keywords.clone(),
                client.clone(),
                delay,
            )?))
        }
    }
}

/// Apply a source's relevance filter. An empty keyword list keeps everything.
pub(crate) fn filter_relevant(
    observations: Vec<RawObservation>,
    keywords: &[String],
) -> Vec<RawObservation> {
    if keywords.is_empty() {
        return observations;
    }
    observations
        .into_iter()
        .filter(|obs| title_matches_any(&obs.title, keywords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    fn obs(title: &str) -> RawObservation {
        RawObservation::new("acme", title, "https://acme.com/jobs/1")
    }

    #[test]
    fn test_filter_relevant_empty_keywords_keeps_all() {
        let kept = filter_relevant(vec![obs("Senior Engineer")], &[]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_relevant_drops_non_matching_titles() {
        let keywords = vec!["intern".to_string()];
        let kept = filter_relevant(
            vec![obs("SWE Intern"), obs("Senior Engineer"), obs("Internal Tools Lead")],
            &keywords,
        );
        let titles: Vec<_> = kept.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["SWE Intern"]);
    }

    #[test]
    fn test_build_adapters_for_default_config() {
        let config = Config::default();
        let client = Client::new();
        let adapters = build_adapters(&config, &client).unwrap();
        let names: Vec<_> = adapters.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["ramp", "palantir"]);
    }

    #[test]
    fn test_build_adapters_skips_disabled_sources() {
        let mut config = Config::default();
        config.sources[0].enabled = false;
        let client = Client::new();
        let adapters = build_adapters(&config, &client).unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].name(), "palantir");
    }
}
