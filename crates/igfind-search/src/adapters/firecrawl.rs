//! Firecrawl search-and-scrape adapter with LLM handle extraction.
//!
//! Runs a handful of query variants against Firecrawl's search endpoint,
//! collects up to [`MAX_CONTENT_BLOCKS`] pages of markdown while recording
//! which directories and address tokens showed up, then asks a model to
//! pick the restaurant's handle out of the combined content.

use igfind_core::{AdapterKind, DirectorySource, EvidenceBundle, SearchFind, SearchTarget};
use reqwest::Client;
use serde::Deserialize;

use super::google::is_business_listing;
use crate::error::SearchError;
use crate::handle::{handle_from_url, handles_in_text, parse_model_handle};
use crate::http::{build_client, check_status, read_json};
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::location::{location_tokens, matched_tokens, parse_address};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::text::truncate_chars;

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev";
const SERVICE: &str = "firecrawl";

pub const MAX_QUERIES: usize = 5;
pub const MAX_CONTENT_BLOCKS: usize = 5;
pub const MAX_CONTENT_CHARS: usize = 4000;
const RESULTS_PER_QUERY: u32 = 3;
const SCRAPE_TIMEOUT_MS: u32 = 15_000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    markdown: Option<String>,
}

#[derive(Clone)]
pub struct FirecrawlSearch {
    client: Client,
    base_url: String,
    api_key: String,
    llm: LlmClient,
    extraction_model: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for FirecrawlSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirecrawlSearch")
            .field("base_url", &self.base_url)
            .field("extraction_model", &self.extraction_model)
            .finish_non_exhaustive()
    }
}

/// Query variants for one target, at most [`MAX_QUERIES`], without duplicates.
/// An empty address yields name-only queries (the corporate-account search).
/// The street-address variant comes last since city and state already pin
/// the location; it is the first dropped when the cap is reached.
#[must_use]
pub fn build_queries(target: &SearchTarget) -> Vec<String> {
    let name = target.restaurant_name.trim();
    let parts = parse_address(&target.address);
    let mut queries: Vec<String> = Vec::new();

    queries.push(format!("\"{name}\" instagram"));
    queries.push(format!("{name} instagram handle"));
    if let Some(city) = &parts.city {
        let state = parts.state.as_deref().unwrap_or("");
        queries.push(format!("\"{name}\" {city} {state} instagram").replace("  ", " "));
        queries.push(format!("site:instagram.com \"{name}\" {city}"));
    } else {
        queries.push(format!("site:instagram.com \"{name}\""));
    }
    queries.push(format!("\"{name}\" site:yelp.com instagram"));
    if let Some(street) = &parts.street {
        queries.push(format!("\"{name}\" \"{street}\" instagram"));
    }
    if target.address.trim().is_empty() {
        queries.push(format!("\"{name}\" official instagram"));
    }

    let mut unique: Vec<String> = Vec::new();
    for q in queries {
        if !unique.contains(&q) {
            unique.push(q);
        }
    }
    unique.truncate(MAX_QUERIES);
    unique
}

fn analysis_prompt(target: &SearchTarget, content: &str) -> String {
    format!(
        "You are analyzing web content to find the Instagram handle for a restaurant.\n\n\
         Restaurant: {name}\n\
         Address: {address}\n\n\
         Content to analyze:\n{content}\n\n\
         Look for Instagram links, handles, or social media mentions.\n\
         Rules:\n\
         - Look for patterns like \"instagram.com/[handle]\", \"@[handle]\", or \"Follow us @[handle]\"\n\
         - Return ONLY the handle, without @ or instagram.com\n\
         - If there are several, choose the one most likely to be this location's official account\n\
         - If no Instagram handle is found, return NOT_FOUND\n\n\
         Restaurant Instagram handle:",
        name = target.restaurant_name,
        address = if target.address.is_empty() {
            "(any location)"
        } else {
            target.address.as_str()
        },
    )
}

impl FirecrawlSearch {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        api_key: &str,
        llm: LlmClient,
        extraction_model: &str,
        timeout_secs: u64,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout_secs, "igfind/0.1")?,
            base_url: FIRECRAWL_API_URL.to_string(),
            api_key: api_key.to_string(),
            llm,
            extraction_model: extraction_model.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn run_query(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/v1/search", self.base_url);
        let body = serde_json::json!({
            "query": query,
            "limit": RESULTS_PER_QUERY,
            "timeout": SCRAPE_TIMEOUT_MS,
            "scrapeOptions": {
                "formats": ["markdown"],
                "onlyMainContent": true,
            },
        });
        let response: SearchResponse = retry_with_backoff(self.retry, SERVICE, || {
            let url = url.clone();
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(body)
                    .send()
                    .await?;
                let response = check_status(SERVICE, response)?;
                read_json(response, "firecrawl search").await
            }
        })
        .await?;
        Ok(response.data)
    }

    /// # Errors
    ///
    /// [`SearchError::RateLimited`] as soon as Firecrawl or the model signals
    /// a rate limit. Other per-query failures are logged and skipped.
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        let tokens = location_tokens(&target.address);
        let mut evidence = EvidenceBundle::default();
        let mut blocks: Vec<String> = Vec::new();
        let mut direct_handles: Vec<String> = Vec::new();

        'queries: for query in build_queries(target) {
            evidence.queries_used.push(query.clone());
            let hits = match self.run_query(&query).await {
                Ok(hits) => hits,
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        restaurant = %target.restaurant_name,
                        query,
                        error = %e,
                        "firecrawl query failed"
                    );
                    continue;
                }
            };

            for hit in hits {
                if let Some(source) = DirectorySource::from_url(&hit.url) {
                    evidence.sources.insert(source);
                }
                if is_business_listing(&hit.url) {
                    evidence.gmb_profile_found = true;
                }
                if let Some(handle) = handle_from_url(&hit.url) {
                    direct_handles.push(handle);
                }

                let content = hit
                    .markdown
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .or(hit.description.as_deref())
                    .unwrap_or("");
                if content.trim().is_empty() {
                    continue;
                }
                evidence
                    .location_matches
                    .extend(matched_tokens(content, &tokens));
                direct_handles.extend(handles_in_text(content));
                evidence
                    .snippets
                    .push(truncate_chars(content, 300).to_string());
                blocks.push(format!(
                    "URL: {}\nTitle: {}\n{}",
                    hit.url,
                    hit.title.as_deref().unwrap_or(""),
                    content
                ));
                if blocks.len() >= MAX_CONTENT_BLOCKS {
                    break 'queries;
                }
            }
        }

        tracing::debug!(
            restaurant = %target.restaurant_name,
            blocks = blocks.len(),
            sources = evidence.sources.len(),
            location_matches = evidence.location_matches.len(),
            "firecrawl content collected"
        );

        if blocks.is_empty() {
            // Nothing for the model to read; a profile linked from a hit
            // is all there is.
            let direct = direct_handles.into_iter().next();
            tracing::debug!(
                restaurant = %target.restaurant_name,
                handle = ?direct,
                "no firecrawl content, skipping analysis"
            );
            return Ok(SearchFind::from_handle(
                direct.as_deref(),
                AdapterKind::Firecrawl,
                evidence,
            ));
        }

        let combined = blocks.join("\n\n---\n\n");
        let content = truncate_chars(&combined, MAX_CONTENT_CHARS);
        let request = ChatRequest::new(
            &self.extraction_model,
            vec![ChatMessage::user(analysis_prompt(target, content))],
        )
        .max_tokens(50);

        let handle = match self.llm.chat(&request).await {
            Ok(answer) => parse_model_handle(&answer),
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    restaurant = %target.restaurant_name,
                    error = %e,
                    "firecrawl content analysis failed, using linked profile if any"
                );
                direct_handles.into_iter().next()
            }
        };

        Ok(SearchFind::from_handle(
            handle.as_deref(),
            AdapterKind::Firecrawl,
            evidence,
        ))
    }
}
