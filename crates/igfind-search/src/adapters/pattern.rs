//! Last-resort adapter: guess common handle shapes and probe each profile.

use igfind_core::{AdapterKind, DirectorySource, EvidenceBundle, SearchFind, SearchTarget};

use crate::error::SearchError;
use crate::location::{location_tokens, matched_tokens};
use crate::profile::ProfileFetcher;
use crate::text::alnum_lower;

const SUFFIXES: &[&str] = &["", "restaurant", "eats", "food", "kitchen", "cafe", "bistro"];

#[derive(Debug, Clone)]
pub struct PatternGuess {
    profiles: ProfileFetcher,
}

/// `{base}`, `{base}restaurant`, `{base}eats`, ... where base is the
/// lower-cased alphanumerics of the name.
#[must_use]
pub fn guesses(restaurant_name: &str) -> Vec<String> {
    let base = alnum_lower(restaurant_name);
    if base.is_empty() {
        return Vec::new();
    }
    SUFFIXES.iter().map(|s| format!("{base}{s}")).collect()
}

impl PatternGuess {
    #[must_use]
    pub fn new(profiles: ProfileFetcher) -> Self {
        Self { profiles }
    }

    /// Returns the first guess whose profile page mentions the restaurant.
    ///
    /// # Errors
    ///
    /// [`SearchError::RateLimited`] when Instagram answers 429: a guess
    /// cannot be confirmed or ruled out while throttled.
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        let tokens = location_tokens(&target.address);
        for handle in guesses(&target.restaurant_name) {
            let page = self.profiles.fetch(&handle).await?;
            if page.is_rate_limited() {
                return Err(SearchError::RateLimited {
                    service: "instagram".to_string(),
                    retry_after_secs: 0,
                });
            }
            if page.mentions_name(&target.restaurant_name) {
                let mut evidence = EvidenceBundle {
                    queries_used: vec![format!("pattern_guess: {handle}")],
                    ..EvidenceBundle::default()
                };
                evidence.sources.insert(DirectorySource::Instagram);
                evidence.location_matches = matched_tokens(&page.text_lower(), &tokens);
                tracing::debug!(restaurant = %target.restaurant_name, handle, "pattern guess matched");
                return Ok(SearchFind::from_handle(
                    Some(handle.as_str()),
                    AdapterKind::PatternGuess,
                    evidence,
                ));
            }
        }
        Ok(SearchFind::Nothing(EvidenceBundle::default()))
    }
}
