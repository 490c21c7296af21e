//! Web search: SerpApi client, page fetching and markup stripping
//!
//! The composer searches, picks up to five organic results (or up to three
//! news results when organic ones are scarce), fetches the first three pages
//! and hands the plain text to the completion service for synthesis.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::{check_status, JarvisError, Result};
use crate::types::{Language, SearchHit};

const SERPAPI_URL: &str = "https://serpapi.com/search.json";

pub const MAX_ORGANIC: usize = 5;
pub const MAX_NEWS: usize = 3;
/// Fewer organic results than this switches to news results
pub const MIN_ORGANIC: usize = 2;
pub const MAX_PAGES: usize = 3;
pub const PAGE_TEXT_MAX_CHARS: usize = 12_000;

/// Raw search results, split by kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub organic: Vec<SearchHit>,
    pub news: Vec<SearchHit>,
}

impl SearchResults {
    /// Up to five organic hits, or up to three news hits if organic ones are scarce
    pub fn select(self) -> Vec<SearchHit> {
        if self.organic.len() < MIN_ORGANIC && !self.news.is_empty() {
            self.news.into_iter().take(MAX_NEWS).collect()
        } else {
            self.organic.into_iter().take(MAX_ORGANIC).collect()
        }
    }
}

/// Search engine collaborator
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str, lang: Language) -> Result<SearchResults>;
}

/// Fetches raw page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// ============================================================================
// SerpApi
// ============================================================================

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SerpApiResponse {
    organic_results: Vec<RawHit>,
    news_results: Vec<RawHit>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

fn into_hits(raw: Vec<RawHit>) -> Vec<SearchHit> {
    raw.into_iter()
        .filter_map(|h| {
            let link = h.link.filter(|l| l.starts_with("http"))?;
            Some(SearchHit {
                title: h.title.unwrap_or_default(),
                link,
            })
        })
        .collect()
}

impl SerpApiResponse {
    fn into_results(self) -> Result<SearchResults> {
        let results = SearchResults {
            organic: into_hits(self.organic_results),
            news: into_hits(self.news_results),
        };
        // SerpApi reports "no results" through the error field
        match self.error {
            Some(e) if results.organic.is_empty() && results.news.is_empty() => {
                Err(JarvisError::EmptyResult(e))
            }
            _ => Ok(results),
        }
    }
}

/// Google search through SerpApi; requires `SERPAPI_KEY`
pub struct SerpApiSearch {
    client: Client,
    api_key: Option<String>,
}

impl SerpApiSearch {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SearchService for SerpApiSearch {
    async fn search(&self, query: &str, lang: Language) -> Result<SearchResults> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(JarvisError::ConfigMissing("SERPAPI_KEY"))?;

        let country = match lang {
            Language::Ro => "ro",
            Language::En => "us",
        };

        let response = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("hl", lang.code()),
                ("gl", country),
                ("num", "10"),
                ("api_key", api_key),
            ])
            .send()
            .await?;

        let resp: SerpApiResponse = check_status("search API", response).await?.json().await?;
        let results = resp.into_results()?;
        tracing::debug!(
            organic = results.organic.len(),
            news = results.news.len(),
            "search returned"
        );
        Ok(results)
    }
}

// ============================================================================
// Page Fetching
// ============================================================================

/// Plain GET of a result page
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        Ok(check_status("page fetch", response).await?.text().await?)
    }
}

// ============================================================================
// Markup Stripping
// ============================================================================

fn non_content_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<svg\b.*?</svg\s*>")
            .expect("Invalid regex")
    })
}

fn tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"))
}

/// Reduce HTML to whitespace-normalized text of at most `max_chars` characters
pub fn strip_markup(html: &str, max_chars: usize) -> String {
    let without_blocks = non_content_blocks().replace_all(html, " ");
    let without_tags = tags().replace_all(&without_blocks, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);

    let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    text.chars().take(max_chars).collect()
}

/// Host of a URL without a leading `www.`
pub fn domain_of(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| link.to_string())
}

/// A fetched page reduced to text
#[derive(Debug, Clone, PartialEq)]
pub struct SourceText {
    pub domain: String,
    pub text: String,
}

/// Concatenate sources, each under a `[Source N: domain]` tag
pub fn sources_block(sources: &[SourceText]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[Source {}: {}]\n{}", i + 1, s.domain, s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Comma-separated distinct domains, in source order
pub fn source_domains(sources: &[SourceText]) -> String {
    let mut domains: Vec<&str> = Vec::new();
    for s in sources {
        if !domains.contains(&s.domain.as_str()) {
            domains.push(&s.domain);
        }
    }
    domains.join(", ")
}
