// src/export.rs

//! Static JSON feed for the job-board frontend.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::CatalogEntry;
use crate::storage;

/// One posting in the frontend's feed shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedJob {
    pub id: String,
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub work_model: &'static str,
    pub team: Option<String>,
    pub discipline: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub apply_url: String,
    pub seniority: &'static str,
    pub is_active: bool,
}

impl ExportedJob {
    fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            company: entry.source.clone(),
            title: entry.title.clone(),
            location: entry.location.clone(),
            // The frontend contract has fields the catalog does not track;
            // they carry the fixed values the feed has always used
            work_model: "hybrid",
            team: entry.team.clone(),
            discipline: entry.team.clone(),
            description: entry.description.clone(),
            tags: Vec::new(),
            posted_at: entry.posted_at.unwrap_or(entry.first_seen),
            apply_url: entry.url.clone(),
            seniority: "internship",
            is_active: entry.is_active,
        }
    }
}

/// Write the catalog as a pretty-printed JSON array, newest first.
///
/// Returns the number of exported postings.
pub async fn write_feed(catalog: &Catalog, path: &Path, include_inactive: bool) -> Result<usize> {
    let entries = catalog.all(include_inactive).await;
    let feed: Vec<ExportedJob> = entries.iter().map(ExportedJob::from_entry).collect();
    storage::write_json_atomic(path, &feed).await?;

    tracing::info!(count = feed.len(), path = %path.display(), "feed exported");
    Ok(feed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalPosting;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn posting(source: &str, slug: &str, title: &str) -> CanonicalPosting {
        CanonicalPosting {
            id: format!("{source}:{slug}"),
            source: source.to_string(),
            title: title.to_string(),
            team: Some("Engineering".to_string()),
            location: None,
            url: format!("https://careers.{source}.com/jobs/{slug}"),
            description: None,
            posted_at: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    async fn seeded_catalog(tmp: &TempDir) -> Catalog {
        let catalog = Catalog::open(tmp.path().join("catalog.json")).await.unwrap();
        catalog
            .reconcile(
                "acme",
                vec![posting("acme", "1", "SWE Intern"), posting("acme", "2", "Data Intern")],
                at(0),
            )
            .await
            .unwrap();
        // Second pass withdraws acme:2
        catalog
            .reconcile("acme", vec![posting("acme", "1", "SWE Intern")], at(60))
            .await
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_feed_excludes_inactive_by_default() {
        let tmp = TempDir::new().unwrap();
        let catalog = seeded_catalog(&tmp).await;
        let out = tmp.path().join("feed/jobs.json");

        let count = write_feed(&catalog, &out, false).await.unwrap();
        assert_eq!(count, 1);

        let text = std::fs::read_to_string(&out).unwrap();
        let feed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(feed.as_array().unwrap().len(), 1);
        assert_eq!(feed[0]["id"], "acme:1");
        assert_eq!(feed[0]["company"], "acme");
        assert_eq!(feed[0]["applyUrl"], "https://careers.acme.com/jobs/1");
        assert_eq!(feed[0]["seniority"], "internship");
        // No posted date from the source, so the feed falls back to first_seen
        let posted: DateTime<Utc> = serde_json::from_value(feed[0]["postedAt"].clone()).unwrap();
        assert_eq!(posted, at(0));
    }

    #[tokio::test]
    async fn test_feed_can_include_inactive() {
        let tmp = TempDir::new().unwrap();
        let catalog = seeded_catalog(&tmp).await;
        let out = tmp.path().join("jobs.json");

        let count = write_feed(&catalog, &out, true).await.unwrap();
        assert_eq!(count, 2);

        let text = std::fs::read_to_string(&out).unwrap();
        let feed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let inactive = feed
            .as_array()
            .unwrap()
            .iter()
            .find(|j| j["id"] == "acme:2")
            .unwrap();
        assert_eq!(inactive["isActive"], false);
    }
}
