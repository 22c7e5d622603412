//! DuckDuckGo HTML endpoint adapter. Needs no API key.

use std::sync::LazyLock;

use igfind_core::{AdapterKind, DirectorySource, EvidenceBundle, SearchFind, SearchTarget};
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Client;

use crate::error::SearchError;
use crate::handle::handle_from_url;
use crate::http::{build_client, check_status};
use crate::retry::{retry_with_backoff, RetryPolicy};

const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com";
const SERVICE: &str = "duckduckgo";

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});

#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

/// Resolve DuckDuckGo's `/l/?uddg=<encoded>` redirect links to their target.
#[must_use]
pub fn resolve_redirect(href: &str) -> String {
    let href = href.replace("&amp;", "&");
    let Some(idx) = href.find("uddg=") else {
        return href;
    };
    let encoded = href[idx + 5..].split('&').next().unwrap_or("");
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Every link target on a results page, with redirects resolved.
#[must_use]
pub fn result_links(html: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| resolve_redirect(m.as_str()))
        .collect()
}

impl DuckDuckGoSearch {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SearchError> {
        Self::with_base_url(timeout_secs, user_agent, DUCKDUCKGO_URL)
    }

    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
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
    /// [`SearchError::RateLimited`] on 429, other transport/status failures.
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        let query = format!(
            "\"{}\" \"{}\" site:instagram.com",
            target.restaurant_name, target.address
        );
        let url = format!("{}/html/", self.base_url);

        let html = retry_with_backoff(self.retry, SERVICE, || {
            let url = url.clone();
            let query = query.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .query(&[("q", query.as_str())])
                    .send()
                    .await?;
                let response = check_status(SERVICE, response)?;
                Ok(response.text().await?)
            }
        })
        .await?;

        let mut evidence = EvidenceBundle {
            queries_used: vec![query],
            ..EvidenceBundle::default()
        };
        let mut found: Option<String> = None;
        for link in result_links(&html) {
            if let Some(source) = DirectorySource::from_url(&link) {
                evidence.sources.insert(source);
            }
            if found.is_none() {
                found = handle_from_url(&link);
            }
        }

        tracing::debug!(
            restaurant = %target.restaurant_name,
            handle = ?found,
            "duckduckgo search finished"
        );

        Ok(SearchFind::from_handle(
            found.as_deref(),
            AdapterKind::DuckDuckGo,
            evidence,
        ))
    }
}
