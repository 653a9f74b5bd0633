// src/sources/board.rs

//! HTML board adapter.
//!
//! Fetches a careers page and extracts listing rows with per-source
//! configured CSS selectors. The markup specifics of any individual board
//! live in configuration, not code.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result, ScrapeError};
use crate::models::{BoardSelectors, RawObservation};
use crate::sources::{SourceAdapter, filter_relevant};

/// Adapter for one selector-driven HTML careers page.
pub struct BoardSource {
    name: String,
    url: String,
    rows: RowSelectors,
    container: Option<Selector>,
    page_param: Option<String>,
    max_pages: u32,
    keywords: Vec<String>,
    client: Client,
    page_delay: Duration,
}

/// Compiled selector set for row extraction.
struct RowSelectors {
    row: Selector,
    title: Selector,
    link: Option<Selector>,
    location: Option<Selector>,
    team: Option<Selector>,
    link_attr: String,
}

impl BoardSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        selectors: &BoardSelectors,
        keywords: Vec<String>,
        client: Client,
        page_delay: Duration,
    ) -> Result<Self> {
        let rows = RowSelectors {
            row: parse_selector(&selectors.row)?,
            title: parse_selector(&selectors.title)?,
            link: selectors
                .link
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            location: selectors
                .location
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            team: selectors.team.as_deref().map(parse_selector).transpose()?,
            link_attr: selectors.link_attr.clone(),
        };

        Ok(Self {
            name: name.into(),
            url: url.into(),
            rows,
            container: selectors
                .container
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            page_param: selectors.page_param.clone(),
            max_pages: selectors.max_pages.max(1),
            keywords,
            client,
            page_delay,
        })
    }

    fn page_url(&self, page: u32) -> String {
        match &self.page_param {
            Some(param) => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}", self.url, sep, param, page)
            }
            None => self.url.clone(),
        }
    }

    /// Extract one page, deciding whether an empty page is trustworthy.
    ///
    /// No rows on the first page fails the poll unless the configured
    /// container selector still matches: a present-but-empty container is a
    /// board with nothing listed, while missing markup means the page
    /// changed shape and an empty "success" would deactivate every listing.
    fn extract_page(
        &self,
        html: &str,
        page_url: &str,
        first_page: bool,
    ) -> std::result::Result<Vec<RawObservation>, ScrapeError> {
        let rows = extract_rows(html, page_url, &self.rows, &self.name);
        if rows.is_empty() && first_page && !self.is_empty_board(html) {
            return Err(ScrapeError::parse(format!(
                "row selector matched nothing at {page_url}"
            )));
        }
        Ok(rows)
    }

    fn is_empty_board(&self, html: &str) -> bool {
        self.container
            .as_ref()
            .is_some_and(|sel| Html::parse_document(html).select(sel).next().is_some())
    }
}

#[async_trait]
impl SourceAdapter for BoardSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self) -> std::result::Result<Vec<RawObservation>, ScrapeError> {
        let pages = if self.page_param.is_some() {
            self.max_pages
        } else {
            1
        };

        let mut seen = HashSet::new();
        let mut observations = Vec::new();

        for page in 1..=pages {
            let page_url = self.page_url(page);
            let html = self
                .client
                .get(&page_url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            let rows = self.extract_page(&html, &page_url, page == 1)?;
            if rows.is_empty() {
                break;
            }

            // Boards sometimes repeat listings across pages
            for obs in rows {
                if seen.insert(obs.url.clone()) {
                    observations.push(obs);
                }
            }

            if page < pages && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        Ok(filter_relevant(observations, &self.keywords))
    }
}

/// Extract listing rows from one page of board markup.
fn extract_rows(
    html: &str,
    page_url: &str,
    selectors: &RowSelectors,
    source: &str,
) -> Vec<RawObservation> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut observations = Vec::new();

    for row in document.select(&selectors.row) {
        let Some(title_elem) = row.select(&selectors.title).next() else {
            continue;
        };
        let title: String = title_elem.text().collect();
        if title.trim().is_empty() {
            continue;
        }

        let link_elem = selectors
            .link
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .or(Some(title_elem));
        let raw_href = link_elem
            .and_then(|e| e.value().attr(&selectors.link_attr))
            .unwrap_or("");
        // A missing href must not resolve to the page URL itself; keep the
        // row with no url so the drop is counted downstream.
        let url = if raw_href.trim().is_empty() {
            String::new()
        } else {
            resolve_url(base.as_ref(), raw_href)
        };

        let location = selectors
            .location
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|e| e.text().collect::<String>());
        let team = selectors
            .team
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|e| e.text().collect::<String>());

        observations.push(RawObservation {
            source: source.to_string(),
            reference: None,
            title,
            url,
            team,
            location,
            description: None,
            posted_at: None,
        });
    }
    observations
}

/// Resolve a potentially relative href against the page URL.
fn resolve_url(base: Option<&Url>, href: &str) -> String {
    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoardSelectors;

    const FIXTURE: &str = r#"
        <html><body>
        <ul class="jobs">
            <li>
                <a class="job-title" href="/roles/data-intern">Data Platform Intern</a>
                <span class="location">Toronto, ON</span>
            </li>
            <li>
                <a class="job-title" href="https://careers.acme.com/roles/swe">Software Engineer</a>
                <span class="location">Remote</span>
            </li>
            <li><span class="location">Orphan row without a title</span></li>
        </ul>
        </body></html>
    "#;

    fn selectors() -> BoardSelectors {
        BoardSelectors {
            row: "ul.jobs li".to_string(),
            title: "a.job-title".to_string(),
            container: None,
            link: None,
            location: Some("span.location".to_string()),
            team: None,
            link_attr: "href".to_string(),
            page_param: None,
            max_pages: 5,
        }
    }

    fn board(selectors: &BoardSelectors) -> BoardSource {
        BoardSource::new(
            "acme",
            "https://careers.acme.com/openings",
            selectors,
            Vec::new(),
            Client::new(),
            Duration::from_millis(0),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_rows() {
        let source = board(&selectors());
        let rows = extract_rows(
            FIXTURE,
            "https://careers.acme.com/openings",
            &source.rows,
            "acme",
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Data Platform Intern");
        assert_eq!(rows[0].url, "https://careers.acme.com/roles/data-intern");
        assert_eq!(rows[0].location.as_deref(), Some("Toronto, ON"));
        assert_eq!(rows[1].url, "https://careers.acme.com/roles/swe");
    }

    #[test]
    fn test_empty_first_page_without_container_is_parse_error() {
        let source = board(&selectors());
        let result = source.extract_page(
            "<html><body><p>Routine maintenance</p></body></html>",
            "https://careers.acme.com/openings",
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_container_is_legitimately_empty() {
        let mut with_container = selectors();
        with_container.container = Some("ul.jobs".to_string());
        let source = board(&with_container);

        // Container present, zero rows: the board really has no listings
        let rows = source
            .extract_page(
                r#"<html><body><ul class="jobs"></ul></body></html>"#,
                "https://careers.acme.com/openings",
                true,
            )
            .unwrap();
        assert!(rows.is_empty());

        // Container gone: the markup changed, not the listings
        let result = source.extract_page(
            "<html><body><p>Routine maintenance</p></body></html>",
            "https://careers.acme.com/openings",
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let mut bad = selectors();
        bad.row = "[[invalid".to_string();
        let result = BoardSource::new(
            "acme",
            "https://careers.acme.com/openings",
            &bad,
            Vec::new(),
            Client::new(),
            Duration::from_millis(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_page_url_separator() {
        let mut with_pages = selectors();
        with_pages.page_param = Some("page".to_string());
        let source = board(&with_pages);
        assert_eq!(
            source.page_url(2),
            "https://careers.acme.com/openings?page=2"
        );

        let mut source = board(&with_pages);
        source.url = "https://careers.acme.com/openings?dept=eng".to_string();
        assert_eq!(
            source.page_url(3),
            "https://careers.acme.com/openings?dept=eng&page=3"
        );
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://careers.acme.com/openings").unwrap();
        assert_eq!(
            resolve_url(Some(&base), "/roles/1"),
            "https://careers.acme.com/roles/1"
        );
        assert_eq!(
            resolve_url(Some(&base), "https://other.com/x"),
            "https://other.com/x"
        );
        assert_eq!(resolve_url(None, "/roles/1"), "/roles/1");
    }
}
