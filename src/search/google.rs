//! Google Books volumes API client.

use crate::error::SearchError;
use crate::types::BookSummary;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::types::{BookCatalog, SearchConfig, SearchKind, SearchQuery};

/// Fallback author when a volume lists none.
const UNKNOWN_AUTHOR: &str = "Unknown Author";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    image_links: Option<ImageLinks>,
    published_date: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

/// Google Books search.
pub struct GoogleBooks {
    http_client: reqwest::blocking::Client,
    base_url: String,
    max_results: usize,
}

impl GoogleBooks {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.google_base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    /// Value of the `q` parameter for `query`.
    pub fn query_param(query: &SearchQuery) -> String {
        let text = query.text.trim();
        match query.kind {
            None => text.to_string(),
            Some(SearchKind::Title) => format!("intitle:{text}"),
            Some(SearchKind::Author) => format!("inauthor:{text}"),
            Some(SearchKind::Subject) | Some(SearchKind::SubjectKey) => {
                format!("subject:{}", text.replace('_', " "))
            }
        }
    }

    /// Parse a volumes response body.
    pub fn parse(body: &str) -> Result<Vec<BookSummary>, SearchError> {
        let response: VolumesResponse =
            serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(response.items.into_iter().map(summarize).collect())
    }
}

fn summarize(volume: Volume) -> BookSummary {
    let info = volume.volume_info;
    BookSummary {
        id: volume.id,
        title: info.title,
        author: if info.authors.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            info.authors.join(", ")
        },
        cover_url: info.image_links.and_then(|links| links.thumbnail),
        subjects: (!info.categories.is_empty()).then_some(info.categories),
        published_year: info.published_date.as_deref().and_then(leading_year),
    }
}

/// Year from dates like `2005`, `2005-03` or `2005-03-01`.
fn leading_year(date: &str) -> Option<i32> {
    date.get(0..4)?.parse().ok()
}

impl BookCatalog for GoogleBooks {
    fn name(&self) -> &'static str {
        "google_books"
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<BookSummary>, SearchError> {
        let url = format!("{}/volumes", self.base_url);
        let q = Self::query_param(query);
        debug!(url = %url, q = %q, "querying Google Books");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("maxResults", self.max_results.to_string().as_str()),
                ("printType", "books"),
            ])
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

        Self::parse(&body)
    }
}
