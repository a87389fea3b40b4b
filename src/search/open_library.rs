//! Open Library search and subjects API client.

use crate::error::SearchError;
use crate::types::BookSummary;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::types::{BookCatalog, SearchConfig, SearchKind, SearchQuery};

const COVERS_BASE_URL: &str = "https://covers.openlibrary.org/b/id";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: String,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    cover_i: Option<i64>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubjectResponse {
    #[serde(default)]
    works: Vec<SubjectWork>,
}

#[derive(Debug, Deserialize)]
struct SubjectWork {
    key: String,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<SubjectAuthor>,
    cover_id: Option<i64>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubjectAuthor {
    name: String,
}

/// Open Library search.
pub struct OpenLibrary {
    http_client: reqwest::blocking::Client,
    base_url: String,
    max_results: usize,
}

impl OpenLibrary {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.open_library_base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    /// Path and query parameters for `query`.
    pub fn request_parts(&self, query: &SearchQuery) -> (String, Vec<(&'static str, String)>) {
        let text = query.text.trim();
        let limit = ("limit", self.max_results.to_string());

        if query.kind == Some(SearchKind::SubjectKey) {
            let url = format!("{}/subjects/{}.json", self.base_url, subject_key(text));
            return (url, vec![limit]);
        }

        let field = match query.kind {
            Some(SearchKind::Title) => "title",
            Some(SearchKind::Author) => "author",
            Some(SearchKind::Subject) => "subject",
            Some(SearchKind::SubjectKey) | None => "q",
        };
        let url = format!("{}/search.json", self.base_url);
        (url, vec![(field, text.to_string()), limit])
    }

    /// Parse a `search.json` response body.
    pub fn parse_search(body: &str) -> Result<Vec<BookSummary>, SearchError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(response
            .docs
            .into_iter()
            .filter_map(|doc| {
                Some(BookSummary {
                    id: work_id(&doc.key),
                    title: doc.title?,
                    author: join_authors(doc.author_name),
                    cover_url: doc.cover_i.map(cover_url),
                    subjects: (!doc.subject.is_empty()).then_some(doc.subject),
                    published_year: doc.first_publish_year,
                })
            })
            .collect())
    }

    /// Parse a `subjects/{key}.json` response body.
    pub fn parse_subject(body: &str) -> Result<Vec<BookSummary>, SearchError> {
        let response: SubjectResponse =
            serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(response
            .works
            .into_iter()
            .filter_map(|work| {
                Some(BookSummary {
                    id: work_id(&work.key),
                    title: work.title?,
                    author: join_authors(work.authors.into_iter().map(|a| a.name).collect()),
                    cover_url: work.cover_id.map(cover_url),
                    subjects: (!work.subject.is_empty()).then_some(work.subject),
                    published_year: work.first_publish_year,
                })
            })
            .collect())
    }
}

/// Subject keys are lowercase with underscores (`Science Fiction` ->
/// `science_fiction`).
pub fn subject_key(text: &str) -> String {
    text.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn work_id(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

fn cover_url(cover_id: i64) -> String {
    format!("{COVERS_BASE_URL}/{cover_id}-M.jpg")
}

fn join_authors(authors: Vec<String>) -> String {
    if authors.is_empty() {
        "Unknown Author".to_string()
    } else {
        authors.join(", ")
    }
}

impl BookCatalog for OpenLibrary {
    fn name(&self) -> &'static str {
        "open_library"
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<BookSummary>, SearchError> {
        let (url, params) = self.request_parts(query);
        debug!(url = %url, "querying Open Library");

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        if query.kind == Some(SearchKind::SubjectKey) {
            Self::parse_subject(&body)
        } else {
            Self::parse_search(&body)
        }
    }
}
