//! Google Custom Search JSON API adapter.

use igfind_core::{AdapterKind, DirectorySource, EvidenceBundle, SearchFind, SearchTarget};
use reqwest::Client;
use serde::Deserialize;

use crate::error::SearchError;
use crate::handle::{handle_from_url, handles_in_text};
use crate::http::{build_client, check_status, read_json};
use crate::location::{location_tokens, matched_tokens};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::text::truncate_chars;

const GOOGLE_API_URL: &str = "https://www.googleapis.com";
const SERVICE: &str = "google_custom_search";
const RESULTS_PER_QUERY: &str = "10";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Clone)]
pub struct GoogleSearch {
    client: Client,
    base_url: String,
    api_key: String,
    cx: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("base_url", &self.base_url)
            .field("cx", &self.cx)
            .finish_non_exhaustive()
    }
}

impl GoogleSearch {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        api_key: &str,
        cx: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, cx, timeout_secs, user_agent, GOOGLE_API_URL)
    }

    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        cx: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cx: cx.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// # Errors
    ///
    /// [`SearchError::RateLimited`] on 429, other transport/status/parse failures.
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        let query = format!(
            "\"{}\" \"{}\" instagram",
            target.restaurant_name, target.address
        );
        let url = format!("{}/customsearch/v1", self.base_url);

        let response: SearchResponse = retry_with_backoff(self.retry, SERVICE, || {
            let url = url.clone();
            let query = query.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .query(&[
                        ("key", self.api_key.as_str()),
                        ("cx", self.cx.as_str()),
                        ("q", query.as_str()),
                        ("num", RESULTS_PER_QUERY),
                    ])
                    .send()
                    .await?;
                let response = check_status(SERVICE, response)?;
                read_json(response, "google custom search").await
            }
        })
        .await?;

        let tokens = location_tokens(&target.address);
        let mut evidence = EvidenceBundle {
            queries_used: vec![query],
            ..EvidenceBundle::default()
        };
        let mut found: Option<String> = None;

        for item in &response.items {
            if let Some(source) = DirectorySource::from_url(&item.link) {
                evidence.sources.insert(source);
            }
            if is_business_listing(&item.link) {
                evidence.gmb_profile_found = true;
            }
            let text = format!("{} {}", item.title, item.snippet);
            evidence
                .location_matches
                .extend(matched_tokens(&text, &tokens));
            if !item.snippet.is_empty() {
                evidence
                    .snippets
                    .push(truncate_chars(&item.snippet, 300).to_string());
            }
            if found.is_none() {
                found = handle_from_url(&item.link)
                    .or_else(|| handles_in_text(&item.snippet).into_iter().next());
            }
        }

        tracing::debug!(
            restaurant = %target.restaurant_name,
            results = response.items.len(),
            handle = ?found,
            "google custom search finished"
        );

        Ok(SearchFind::from_handle(
            found.as_deref(),
            AdapterKind::GoogleCustomSearch,
            evidence,
        ))
    }
}

/// Google Business / Maps listing URLs.
pub(crate) fn is_business_listing(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("google.com/maps")
        || lower.contains("maps.google.")
        || lower.contains("business.google.com")
        || lower.contains("g.page/")
        || lower.contains("goo.gl/maps")
}
