//! The discovery channels, as a closed set of variants behind one `search`.

mod duckduckgo;
mod firecrawl;
mod google;
mod gpt_web;
mod pattern;

pub use duckduckgo::{resolve_redirect, result_links, DuckDuckGoSearch};
pub use firecrawl::{build_queries, FirecrawlSearch, MAX_CONTENT_BLOCKS, MAX_CONTENT_CHARS, MAX_QUERIES};
pub use google::GoogleSearch;
pub use gpt_web::GptWebSearch;
pub use pattern::{guesses, PatternGuess};

use igfind_core::{AdapterKind, AppConfig, SearchFind, SearchTarget};

use crate::error::SearchError;
use crate::llm::LlmClient;
use crate::profile::ProfileFetcher;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub enum SearchAdapter {
    Google(GoogleSearch),
    GptWeb(GptWebSearch),
    Firecrawl(FirecrawlSearch),
    DuckDuckGo(DuckDuckGoSearch),
    PatternGuess(PatternGuess),
}

impl SearchAdapter {
    #[must_use]
    pub fn kind(&self) -> AdapterKind {
        match self {
            SearchAdapter::Google(_) => AdapterKind::GoogleCustomSearch,
            SearchAdapter::GptWeb(_) => AdapterKind::GptWebSearch,
            SearchAdapter::Firecrawl(_) => AdapterKind::Firecrawl,
            SearchAdapter::DuckDuckGo(_) => AdapterKind::DuckDuckGo,
            SearchAdapter::PatternGuess(_) => AdapterKind::PatternGuess,
        }
    }

    /// Whether the simplified-name fallback re-runs this adapter. The pattern
    /// guesser is excluded: stripping a qualifier rarely changes its guesses'
    /// outcome and each guess costs a profile fetch.
    #[must_use]
    pub fn reruns_on_simplified_name(&self) -> bool {
        !matches!(self, SearchAdapter::PatternGuess(_))
    }

    /// Look for a handle for `target`.
    ///
    /// # Errors
    ///
    /// Adapter failures, with rate limits reported as
    /// [`SearchError::RateLimited`] (see [`SearchError::is_rate_limited`]).
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        match self {
            SearchAdapter::Google(a) => a.search(target).await,
            SearchAdapter::GptWeb(a) => a.search(target).await,
            SearchAdapter::Firecrawl(a) => a.search(target).await,
            SearchAdapter::DuckDuckGo(a) => a.search(target).await,
            SearchAdapter::PatternGuess(a) => a.search(target).await,
        }
    }
}

/// Every adapter the configuration enables, in priority order:
/// Google, GPT web search, Firecrawl, DuckDuckGo, pattern guess.
///
/// Adapters whose credentials are missing are skipped with a debug log.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if an HTTP client cannot be constructed.
pub fn from_config(
    config: &AppConfig,
    llm: Option<&LlmClient>,
    profiles: &ProfileFetcher,
) -> Result<Vec<SearchAdapter>, SearchError> {
    let retry = RetryPolicy {
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    };
    let mut adapters = Vec::new();

    match (
        config.enable_google,
        &config.google_search_api_key,
        &config.google_search_cx,
    ) {
        (true, Some(key), Some(cx)) => {
            let google =
                GoogleSearch::new(key, cx, config.request_timeout_secs, &config.user_agent)?
                    .with_retry_policy(retry);
            adapters.push(SearchAdapter::Google(google));
        }
        (false, _, _) => tracing::debug!(adapter = "google_custom_search", "disabled"),
        _ => tracing::debug!(adapter = "google_custom_search", "not configured, skipping"),
    }

    if let Some(llm) = llm {
        adapters.push(SearchAdapter::GptWeb(GptWebSearch::new(
            llm.clone(),
            &config.web_search_model,
            &config.extraction_model,
        )));
    } else {
        tracing::debug!(adapter = "gpt_web_search", "no LLM configured, skipping");
    }

    if let Some(firecrawl) = firecrawl_from_config(config, llm)? {
        adapters.push(SearchAdapter::Firecrawl(firecrawl));
    } else {
        tracing::debug!(adapter = "firecrawl", "not configured, skipping");
    }

    if config.enable_duckduckgo {
        let ddg = DuckDuckGoSearch::new(config.request_timeout_secs, &config.user_agent)?
            .with_retry_policy(retry);
        adapters.push(SearchAdapter::DuckDuckGo(ddg));
    }

    adapters.push(SearchAdapter::PatternGuess(PatternGuess::new(profiles.clone())));

    Ok(adapters)
}

/// The Firecrawl adapter, when both a Firecrawl key and an LLM are available.
/// Also used on its own for the corporate-account fallback.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
pub fn firecrawl_from_config(
    config: &AppConfig,
    llm: Option<&LlmClient>,
) -> Result<Option<FirecrawlSearch>, SearchError> {
    let (Some(key), Some(llm)) = (&config.firecrawl_api_key, llm) else {
        return Ok(None);
    };
    let firecrawl = FirecrawlSearch::new(
        key,
        llm.clone(),
        &config.extraction_model,
        config.request_timeout_secs,
    )?
    .with_retry_policy(RetryPolicy {
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    });
    Ok(Some(firecrawl))
}
