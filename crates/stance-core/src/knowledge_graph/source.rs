/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/


//! Encyclopedia text retrieval

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{PipelineError, PipelineResult};
use crate::knowledge_graph::Document;

pub const DEFAULT_MAX_DOCS: usize = 25;
pub const DEFAULT_MAX_CHARS: usize = 4000;
pub const DEFAULT_LANG: &str = "en";
const USER_AGENT: &str = concat!("stance-core/", env!("CARGO_PKG_VERSION"));

/// Source of free-form text about a named entity
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Zero or more documents for `query`
    async fn load(&self, query: &str) -> PipelineResult<Vec<Document>>;
}

#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub lang: String,
    pub max_docs: usize,
    /// Page text is cut to this many characters
    pub max_chars: usize,
    /// Overrides `https://{lang}.wikipedia.org/w/api.php`
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            max_docs: DEFAULT_MAX_DOCS,
            max_chars: DEFAULT_MAX_CHARS,
            api_url: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl WikipediaConfig {
    fn endpoint(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.wikipedia.org/w/api.php", self.lang))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

/// Page titles from a `list=search` response
fn parse_search_titles(body: &str) -> PipelineResult<Vec<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

/// Plain-text page from a `prop=extracts|info` response
fn parse_page(body: &str, max_chars: usize) -> PipelineResult<Option<Document>> {
    let value: Value = serde_json::from_str(body)?;
    let Some(pages) = value.pointer("/query/pages").and_then(Value::as_object) else {
        return Ok(None);
    };

    let Some(page) = pages.values().find(|p| p.get("missing").is_none()) else {
        return Ok(None);
    };
    let extract = page.get("extract").and_then(Value::as_str).unwrap_or_default();
    if extract.trim().is_empty() {
        return Ok(None);
    }

    let content: String = extract.chars().take(max_chars).collect();
    let mut document = Document::new(content);
    if let Some(title) = page.get("title").and_then(Value::as_str) {
        document = document.with_metadata("title", title);
    }
    if let Some(url) = page.get("fullurl").and_then(Value::as_str) {
        document = document.with_metadata("source", url);
    }
    Ok(Some(document))
}

/// Wikipedia search plus per-page plain-text extracts via the MediaWiki API
pub struct WikipediaSource {
    client: Client,
    config: WikipediaConfig,
}

impl WikipediaSource {
    pub fn new(config: WikipediaConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn get(&self, params: &[(&str, &str)]) -> PipelineResult<String> {
        let response = self
            .client
            .get(self.config.endpoint())
            .query(params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::ContentSource {
                message: format!("MediaWiki API returned HTTP {}", status),
            });
        }
        Ok(response.text().await?)
    }

    async fn search(&self, query: &str) -> PipelineResult<Vec<String>> {
        let limit = self.config.max_docs.to_string();
        let body = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .await?;
        parse_search_titles(&body)
    }

    async fn fetch_page(&self, title: &str) -> PipelineResult<Option<Document>> {
        let body = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts|info"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .await?;
        parse_page(&body, self.config.max_chars)
    }
}

#[async_trait]
impl ContentSource for WikipediaSource {
    async fn load(&self, query: &str) -> PipelineResult<Vec<Document>> {
        let titles = self.search(query).await?;
        debug!("Wikipedia search for '{}' returned {} titles", query, titles.len());

        let mut documents = Vec::new();
        for title in titles.iter().take(self.config.max_docs) {
            match self.fetch_page(title).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => debug!("No extract for page '{}'", title),
                Err(e) => warn!("Failed to load page '{}': {}", title, e),
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_titles() {
        let body = r#"{"batchcomplete": "", "query": {"searchinfo": {"totalhits": 2},
            "search": [{"ns": 0, "title": "Awami League", "pageid": 1},
                       {"ns": 0, "title": "Sheikh Hasina", "pageid": 2}]}}"#;
        assert_eq!(
            parse_search_titles(body).unwrap(),
            vec!["Awami League".to_string(), "Sheikh Hasina".to_string()]
        );
        assert!(parse_search_titles(r#"{"batchcomplete": ""}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_truncates_and_records_source() {
        let body = r#"{"query": {"pages": {"42": {"pageid": 42, "title": "Dhaka",
            "fullurl": "https://en.wikipedia.org/wiki/Dhaka",
            "extract": "Dhaka is the capital of Bangladesh."}}}}"#;
        let document = parse_page(body, 5).unwrap().unwrap();
        assert_eq!(document.page_content, "Dhaka");
        assert_eq!(document.metadata["title"], "Dhaka");
        assert_eq!(document.metadata["source"], "https://en.wikipedia.org/wiki/Dhaka");
    }

    #[test]
    fn test_missing_page_yields_nothing() {
        let body = r#"{"query": {"pages": {"-1": {"ns": 0, "title": "Nope", "missing": ""}}}}"#;
        assert!(parse_page(body, 100).unwrap().is_none());
    }

    #[test]
    fn test_endpoint_follows_language() {
        let config = WikipediaConfig {
            lang: "bn".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "https://bn.wikipedia.org/w/api.php");
    }
}
