//! Strategy orchestrator: adapters in priority order, first verified
//! candidate wins, then the simplified-name and corporate fallbacks.
//!
//! Evidence is pooled per target: what earlier adapters saw (including ones
//! that found nothing or whose candidate was rejected) and what the winning
//! profile page shows are merged into the winner's bundle before scoring.
//! The corporate path starts from its own evidence only, since location
//! signals for one store say nothing about a brand-wide account.

use std::collections::HashSet;
use std::time::Duration;

use igfind_core::{Candidate, DiscoveryPath, EvidenceBundle, SearchFind, SearchTarget};
use igfind_search::text::simplify_name;
use igfind_search::{RateLimitCooldown, SearchAdapter, SearchError};

use crate::verify::{Verification, Verifier};

/// A verified candidate and the target it was searched and verified against
/// (the simplified or name-only variant on fallback paths).
#[derive(Debug, Clone)]
pub struct Discovery {
    pub candidate: Candidate,
    pub verification: Verification,
    pub searched_as: SearchTarget,
}

/// Per-target state shared across adapter attempts.
#[derive(Debug, Default)]
struct Attempts {
    /// Lower-cased handles that failed verification.
    rejected: HashSet<String>,
    evidence: EvidenceBundle,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    adapters: Vec<SearchAdapter>,
    corporate: Option<SearchAdapter>,
    verifier: Verifier,
    cooldown: RateLimitCooldown,
    adapter_timeout: Duration,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        adapters: Vec<SearchAdapter>,
        verifier: Verifier,
        cooldown: RateLimitCooldown,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            corporate: None,
            verifier,
            cooldown,
            adapter_timeout,
        }
    }

    /// Enable the corporate-account fallback with a name-only searcher.
    #[must_use]
    pub fn with_corporate_fallback(mut self, adapter: SearchAdapter) -> Self {
        self.corporate = Some(adapter);
        self
    }

    #[must_use]
    pub fn cooldown(&self) -> &RateLimitCooldown {
        &self.cooldown
    }

    /// Find the first verified candidate for `target`, or `None`.
    pub async fn discover(&self, target: &SearchTarget) -> Option<Discovery> {
        let mut attempts = Attempts::default();

        for adapter in &self.adapters {
            if let Some(found) = self
                .try_adapter(adapter, target, DiscoveryPath::Primary, &mut attempts)
                .await
            {
                return Some(found);
            }
        }

        if let Some(simplified) = simplify_name(&target.restaurant_name) {
            tracing::info!(
                restaurant = %target.restaurant_name,
                simplified = %simplified,
                "primary strategies exhausted, retrying with simplified name"
            );
            let renamed = target.renamed(&simplified);
            for adapter in self.adapters.iter().filter(|a| a.reruns_on_simplified_name()) {
                if let Some(found) = self
                    .try_adapter(adapter, &renamed, DiscoveryPath::SimplifiedName, &mut attempts)
                    .await
                {
                    return Some(found);
                }
            }
        }

        if let Some(corporate) = &self.corporate {
            let name = simplify_name(&target.restaurant_name)
                .unwrap_or_else(|| target.restaurant_name.clone());
            tracing::info!(
                restaurant = %target.restaurant_name,
                "searching for a corporate account"
            );
            let name_only = SearchTarget {
                address: String::new(),
                phone: None,
                ..target.renamed(&name)
            };
            if let Some(found) = self
                .try_adapter(corporate, &name_only, DiscoveryPath::Corporate, &mut attempts)
                .await
            {
                return Some(found);
            }
        }

        tracing::info!(restaurant = %target.restaurant_name, "no verified candidate");
        None
    }

    /// One adapter attempt. Adapter failures are logged and swallowed; rate
    /// limits trip the shared cooldown on the way.
    async fn try_adapter(
        &self,
        adapter: &SearchAdapter,
        target: &SearchTarget,
        path: DiscoveryPath,
        attempts: &mut Attempts,
    ) -> Option<Discovery> {
        self.cooldown.wait_ready().await;

        let kind = adapter.kind();
        let outcome = match tokio::time::timeout(self.adapter_timeout, adapter.search(target)).await
        {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                adapter: kind.to_string(),
                secs: self.adapter_timeout.as_secs(),
            }),
        };

        let mut candidate = match outcome {
            Ok(SearchFind::Found(candidate)) => candidate.on_path(path),
            Ok(SearchFind::Nothing(evidence)) => {
                tracing::debug!(restaurant = %target.restaurant_name, adapter = %kind, "no candidate");
                attempts.evidence.merge(evidence);
                return None;
            }
            Err(e) => {
                let rate_limited = self.cooldown.observe(&e);
                tracing::warn!(
                    restaurant = %target.restaurant_name,
                    adapter = %kind,
                    rate_limited,
                    error = %e,
                    "adapter failed, moving on"
                );
                return None;
            }
        };

        let key = candidate.handle.to_lowercase();
        if attempts.rejected.contains(&key) {
            tracing::debug!(handle = %candidate.handle, adapter = %kind, "already rejected, skipping");
            attempts.evidence.merge(candidate.evidence);
            return None;
        }

        let verification = self.verifier.verify(&candidate, target).await;
        if verification.result.passed() {
            candidate.evidence.merge(verification.evidence.clone());
            if path != DiscoveryPath::Corporate {
                candidate.evidence.merge(std::mem::take(&mut attempts.evidence));
            }
            tracing::info!(
                restaurant = %target.restaurant_name,
                adapter = %kind,
                handle = %candidate.handle,
                path = ?path,
                "candidate verified"
            );
            Some(Discovery {
                candidate,
                verification,
                searched_as: target.clone(),
            })
        } else {
            tracing::info!(
                restaurant = %target.restaurant_name,
                adapter = %kind,
                handle = %candidate.handle,
                html_check = ?verification.result.html_check,
                ai_reason = %verification.result.ai_reason,
                "candidate failed verification"
            );
            attempts.rejected.insert(key);
            attempts.evidence.merge(candidate.evidence);
            None
        }
    }
}
