//! Public Instagram profile page fetcher.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;

use crate::error::SearchError;
use crate::http::build_client;
use crate::text::{alnum_lower, name_words};

const INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("valid meta tag regex"));

static DESCRIPTION_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:property|name)\s*=\s*["'](?:og:description|description)["']"#)
        .expect("valid description attr regex")
});

static CONTENT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)content\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid content attr regex")
});

static TAGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<[^>]+>")
        .expect("valid tags regex")
});

/// What the profile URL answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePage {
    pub status: u16,
    pub body: String,
}

impl ProfilePage {
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status == 200
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Bio/description text from the page's meta tags, HTML entities decoded.
    #[must_use]
    pub fn bio(&self) -> Option<String> {
        if !self.is_found() {
            return None;
        }
        extract_bio(&self.body)
    }

    /// Visible text of the page with markup stripped, lower-cased.
    #[must_use]
    pub fn text_lower(&self) -> String {
        page_text(&self.body).to_lowercase()
    }

    /// At least half of the restaurant's name words appear in the page.
    #[must_use]
    pub fn mentions_name(&self, restaurant_name: &str) -> bool {
        if !self.is_found() {
            return false;
        }
        let words = name_words(restaurant_name);
        if words.is_empty() {
            return false;
        }
        let haystack = alnum_lower(&self.body);
        let hits = words.iter().filter(|w| haystack.contains(w.as_str())).count();
        hits * 2 >= words.len()
    }
}

/// Content of the first `og:description` or `description` meta tag.
#[must_use]
pub fn extract_bio(html: &str) -> Option<String> {
    META_TAG_RE
        .find_iter(html)
        .map(|tag| tag.as_str())
        .filter(|tag| DESCRIPTION_ATTR_RE.is_match(tag))
        .find_map(|tag| {
            let caps = CONTENT_ATTR_RE.captures(tag)?;
            let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let bio = decode_entities(raw.trim());
            if bio.is_empty() {
                None
            } else {
                Some(bio)
            }
        })
}

/// Page text with scripts, styles and tags removed.
#[must_use]
pub fn page_text(html: &str) -> String {
    let stripped = TAGS_RE.replace_all(html, " ");
    decode_entities(&stripped.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

/// Fetches `{base}/{handle}/` with a browser user agent.
///
/// Non-2xx statuses are returned as data, not errors: callers interpret
/// 404 and 429 themselves. Only transport failures are errors.
#[derive(Debug, Clone)]
pub struct ProfileFetcher {
    client: Client,
    base_url: String,
}

impl ProfileFetcher {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SearchError> {
        Self::with_base_url(timeout_secs, user_agent, INSTAGRAM_BASE_URL)
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
        })
    }

    /// # Errors
    ///
    /// Returns [`SearchError::Http`] on network failure.
    pub async fn fetch(&self, handle: &str) -> Result<ProfilePage, SearchError> {
        let url = format!("{}/{handle}/", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = if status == 200 {
            response.text().await?
        } else {
            String::new()
        };
        tracing::debug!(handle, status, "fetched profile page");
        Ok(ProfilePage { status, body })
    }
}
