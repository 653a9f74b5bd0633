// src/sources/lever.rs

//! Lever postings adapter.
//!
//! Polls the public postings API at
//! `https://api.lever.co/v0/postings/{site}?mode=json`, paging with
//! `skip`/`limit` and a politeness delay between pages. Posting ids are
//! UUIDs and become the stable reference.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ScrapeError;
use crate::models::RawObservation;
use crate::sources::{SourceAdapter, filter_relevant};

const POSTINGS_API: &str = "https://api.lever.co/v0/postings";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 50;

/// Adapter for one Lever site.
pub struct LeverSource {
    name: String,
    site: String,
    keywords: Vec<String>,
    client: Client,
    page_delay: Duration,
}

impl LeverSource {
    pub fn new(
        name: impl Into<String>,
        site: impl Into<String>,
        keywords: Vec<String>,
        client: Client,
        page_delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            site: site.into(),
            keywords,
            client,
            page_delay,
        }
    }

    fn page_url(&self, skip: usize) -> String {
        format!(
            "{}/{}?mode=json&skip={}&limit={}",
            POSTINGS_API, self.site, skip, PAGE_SIZE
        )
    }

    async fn fetch_page(&self, skip: usize) -> Result<Vec<LeverPosting>, ScrapeError> {
        let response = self
            .client
            .get(self.page_url(skip))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SourceAdapter for LeverSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Result<Vec<RawObservation>, ScrapeError> {
        let mut observations = Vec::new();

        for page in 0..MAX_PAGES {
            let postings = self.fetch_page(page * PAGE_SIZE).await?;
            let page_len = postings.len();
            observations.extend(observations_from(postings, &self.name));

            if page_len < PAGE_SIZE {
                break;
            }
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        Ok(filter_relevant(observations, &self.keywords))
    }
}

#[derive(Debug, Deserialize)]
struct LeverPosting {
    id: String,
    /// Listing title
    text: String,
    #[serde(rename = "hostedUrl")]
    hosted_url: String,
    #[serde(default)]
    categories: LeverCategories,
    #[serde(rename = "createdAt", default)]
    created_at: Option<i64>,
    #[serde(rename = "descriptionPlain", default)]
    description_plain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// Map one page of postings onto raw observations.
fn observations_from(postings: Vec<LeverPosting>, source: &str) -> Vec<RawObservation> {
    postings
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .map(|p| RawObservation {
            source: source.to_string(),
            reference: Some(p.id),
            title: p.text,
            url: p.hosted_url,
            team: p.categories.team,
            location: p.categories.location,
            description: p.description_plain,
            posted_at: p.created_at.and_then(millis_to_utc),
        })
        .collect()
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {
            "id": "c8a62d5c-2b77-4fae-a2c9-4c2d9df47aa1",
            "text": "Backend Engineering Intern",
            "hostedUrl": "https://jobs.lever.co/acme/c8a62d5c-2b77-4fae-a2c9-4c2d9df47aa1",
            "categories": { "team": "Platform", "location": "Remote" },
            "createdAt": 1767225600000,
            "descriptionPlain": "Build the backend."
        },
        {
            "id": "11111111-2222-3333-4444-555555555555",
            "text": "Recruiter",
            "hostedUrl": "https://jobs.lever.co/acme/11111111-2222-3333-4444-555555555555"
        }
    ]"#;

    #[test]
    fn test_parses_postings_page() {
        let postings: Vec<LeverPosting> = serde_json::from_str(FIXTURE).unwrap();
        let observations = observations_from(postings, "acme");

        assert_eq!(observations.len(), 2);
        let first = &observations[0];
        assert_eq!(
            first.reference.as_deref(),
            Some("c8a62d5c-2b77-4fae-a2c9-4c2d9df47aa1")
        );
        assert_eq!(first.team.as_deref(), Some("Platform"));
        assert_eq!(first.description.as_deref(), Some("Build the backend."));
        assert_eq!(
            first.posted_at.unwrap().to_rfc3339(),
            "2026-01-01T00:00:00+00:00"
        );

        let second = &observations[1];
        assert_eq!(second.team, None);
        assert_eq!(second.posted_at, None);
    }

    #[test]
    fn test_page_url() {
        let source = LeverSource::new(
            "acme",
            "acme",
            Vec::new(),
            Client::new(),
            Duration::from_millis(0),
        );
        assert_eq!(
            source.page_url(200),
            "https://api.lever.co/v0/postings/acme?mode=json&skip=200&limit=100"
        );
    }
}
