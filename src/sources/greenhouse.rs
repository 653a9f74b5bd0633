// src/sources/greenhouse.rs

//! Greenhouse job-board adapter.
//!
//! Polls the public boards API at
//! `https://boards-api.greenhouse.io/v1/boards/{token}/jobs`. Every job in
//! the response carries a numeric id, which becomes the posting's stable
//! reference.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ScrapeError;
use crate::models::RawObservation;
use crate::sources::{SourceAdapter, filter_relevant};

const BOARDS_API: &str = "https://boards-api.greenhouse.io/v1/boards";

/// Adapter for one Greenhouse board.
pub struct GreenhouseSource {
    name: String,
    board_token: String,
    keywords: Vec<String>,
    client: Client,
}

impl GreenhouseSource {
    pub fn new(
        name: impl Into<String>,
        board_token: impl Into<String>,
        keywords: Vec<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            board_token: board_token.into(),
            keywords,
            client,
        }
    }

    fn jobs_url(&self) -> String {
        format!("{}/{}/jobs", BOARDS_API, self.board_token)
    }
}

#[async_trait]
impl SourceAdapter for GreenhouseSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> Result<Vec<RawObservation>, ScrapeError> {
        let response = self
            .client
            .get(self.jobs_url())
            .send()
            .await?
            .error_for_status()?;
        let board: BoardResponse = response.json().await?;

        let observations = observations_from(board, &self.name);
        Ok(filter_relevant(observations, &self.keywords))
    }
}

#[derive(Debug, Deserialize)]
struct BoardResponse {
    #[serde(default)]
    jobs: Vec<BoardJob>,
}

#[derive(Debug, Deserialize)]
struct BoardJob {
    id: u64,
    title: String,
    absolute_url: String,
    #[serde(default)]
    location: Option<JobLocation>,
    #[serde(default)]
    departments: Vec<JobDepartment>,
    #[serde(default)]
    first_published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobLocation {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobDepartment {
    #[serde(default)]
    name: Option<String>,
}

/// Map an API response onto raw observations.
fn observations_from(board: BoardResponse, source: &str) -> Vec<RawObservation> {
    board
        .jobs
        .into_iter()
        .filter(|job| !job.title.trim().is_empty())
        .map(|job| RawObservation {
            source: source.to_string(),
            reference: Some(job.id.to_string()),
            title: job.title,
            url: job.absolute_url,
            team: job.departments.into_iter().find_map(|d| d.name),
            location: job.location.and_then(|l| l.name),
            description: None,
            posted_at: job.first_published.as_deref().and_then(parse_timestamp),
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "jobs": [
            {
                "id": 4567890,
                "title": "Software Engineer Intern",
                "absolute_url": "https://boards.greenhouse.io/acme/jobs/4567890",
                "location": { "name": "New York, NY" },
                "departments": [ { "name": "Engineering" } ],
                "first_published": "2026-02-03T12:00:00-05:00"
            },
            {
                "id": 4567891,
                "title": "Account Executive",
                "absolute_url": "https://boards.greenhouse.io/acme/jobs/4567891",
                "location": null,
                "departments": []
            }
        ],
        "meta": { "total": 2 }
    }"#;

    #[test]
    fn test_parses_board_response() {
        let board: BoardResponse = serde_json::from_str(FIXTURE).unwrap();
        let observations = observations_from(board, "acme");

        assert_eq!(observations.len(), 2);
        let first = &observations[0];
        assert_eq!(first.source, "acme");
        assert_eq!(first.reference.as_deref(), Some("4567890"));
        assert_eq!(first.team.as_deref(), Some("Engineering"));
        assert_eq!(first.location.as_deref(), Some("New York, NY"));
        assert!(first.posted_at.is_some());

        let second = &observations[1];
        assert_eq!(second.reference.as_deref(), Some("4567891"));
        assert_eq!(second.team, None);
        assert_eq!(second.posted_at, None);
    }

    #[test]
    fn test_jobs_url() {
        let source = GreenhouseSource::new("acme", "acme-board", Vec::new(), Client::new());
        assert_eq!(
            source.jobs_url(),
            "https://boards-api.greenhouse.io/v1/boards/acme-board/jobs"
        );
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2026-02-03T12:00:00-05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-03T17:00:00+00:00");
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
