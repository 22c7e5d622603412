//! Per-target pipeline: orchestrate, verify, score, and turn the outcome
//! into a [`DiscoveryResult`].

use std::time::{Duration, Instant};

use igfind_core::{
    AppConfig, DiscoveryPath, DiscoveryResult, DiscoveryStatus, ScoringConfig, SearchTarget,
};
use igfind_search::{adapters, LlmClient, ProfileFetcher, RateLimitCooldown, SearchAdapter};

use crate::error::FinderError;
use crate::orchestrator::{Discovery, Orchestrator};
use crate::scoring::{self, ScoringInput};
use crate::verify::{PlausibilityJudge, Verifier};

#[derive(Debug, Clone)]
pub struct Finder {
    orchestrator: Orchestrator,
    scoring: ScoringConfig,
}

impl Finder {
    #[must_use]
    pub fn new(orchestrator: Orchestrator, scoring: ScoringConfig) -> Self {
        Self {
            orchestrator,
            scoring,
        }
    }

    /// Wire every enabled adapter, the verifier and the corporate fallback
    /// from configuration. `cooldown` is shared with the caller so a bulk
    /// run can gate task starts on it.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Search`] if an HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        scoring: ScoringConfig,
        cooldown: RateLimitCooldown,
    ) -> Result<Self, FinderError> {
        let llm = LlmClient::from_config(config)?;
        let profiles = ProfileFetcher::new(config.request_timeout_secs, &config.user_agent)?;
        let search_adapters = adapters::from_config(config, llm.as_ref(), &profiles)?;

        let judge = llm
            .clone()
            .filter(|_| config.use_ai_verification)
            .map(|llm| {
                PlausibilityJudge::new(llm, &config.ai_verification_model, config.ai_min_confidence)
            });
        let ai_verification = judge.is_some();
        let verifier = Verifier::new(profiles, judge).with_cooldown(cooldown.clone());

        let kinds: Vec<String> = search_adapters.iter().map(|a| a.kind().to_string()).collect();
        let mut orchestrator = Orchestrator::new(
            search_adapters,
            verifier,
            cooldown,
            Duration::from_secs(config.adapter_timeout_secs),
        );

        let mut corporate_fallback = false;
        if config.enable_corporate_fallback {
            if let Some(firecrawl) = adapters::firecrawl_from_config(config, llm.as_ref())? {
                orchestrator =
                    orchestrator.with_corporate_fallback(SearchAdapter::Firecrawl(firecrawl));
                corporate_fallback = true;
            }
        }

        tracing::info!(
            adapters = %kinds.join(","),
            ai_verification,
            corporate_fallback,
            "finder ready"
        );
        Ok(Self::new(orchestrator, scoring))
    }

    #[must_use]
    pub fn cooldown(&self) -> &RateLimitCooldown {
        self.orchestrator.cooldown()
    }

    /// Run the whole chain for one target. Never fails: every outcome,
    /// including unusable input, is a [`DiscoveryResult`].
    pub async fn discover(&self, target: &SearchTarget) -> DiscoveryResult {
        let started = Instant::now();

        let mut result = if target.restaurant_name.is_empty() {
            DiscoveryResult::error(target, "restaurant name is empty")
        } else {
            match self.orchestrator.discover(target).await {
                Some(discovery) => self.conclude(target, &discovery),
                None => DiscoveryResult::not_found(target, "No handle found"),
            }
        };
        result.processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            restaurant = %target.restaurant_name,
            handle = %result.instagram_handle,
            status = %result.status,
            score = result.confidence.map(|c| c.value),
            elapsed_ms = result.processing_time_ms,
            "discovery finished"
        );
        result
    }

    fn conclude(&self, target: &SearchTarget, discovery: &Discovery) -> DiscoveryResult {
        let candidate = &discovery.candidate;
        let verification = &discovery.verification.result;

        let (mut status, mut message) = match candidate.path {
            DiscoveryPath::Primary => (
                DiscoveryStatus::Ok,
                format!("Found via {}", candidate.adapter),
            ),
            DiscoveryPath::SimplifiedName => (
                DiscoveryStatus::Probable,
                format!(
                    "Found via simplified name \"{}\"",
                    discovery.searched_as.restaurant_name
                ),
            ),
            DiscoveryPath::Corporate => (
                DiscoveryStatus::Probable,
                "Using corporate/global account".to_string(),
            ),
        };
        if verification.ai_disagrees() {
            status = DiscoveryStatus::Probable;
            let low = format!("AI low confidence: {}", verification.ai_reason);
            message = if candidate.path == DiscoveryPath::Primary {
                low
            } else {
                format!("{message}; {low}")
            };
        } else if verification.ai_soft_pass {
            message = format!("{message} ({})", verification.ai_reason);
        }

        // Score with the name that found the handle but the real location.
        let scored_target = target.renamed(&discovery.searched_as.restaurant_name);
        let breakdown = scoring::score(
            &self.scoring,
            &ScoringInput {
                candidate,
                target: &scored_target,
                status,
                verification,
                page: discovery.verification.page.as_ref(),
            },
        );
        let concerns = breakdown.concerns();

        tracing::debug!(
            handle = %candidate.handle,
            base = breakdown.base_score,
            adjusted = breakdown.adjusted_score,
            red_flags = breakdown.red_flags,
            geographic_flags = breakdown.geographic_flags,
            ai_delta = breakdown.ai_delta,
            "candidate scored"
        );

        let mut result = if let Some(reason) = &breakdown.rejection {
            tracing::info!(
                restaurant = %target.restaurant_name,
                handle = %candidate.handle,
                reason = %reason,
                "candidate rejected by scoring"
            );
            let mut rejected =
                DiscoveryResult::not_found(target, format!("Rejected @{}: {reason}", candidate.handle));
            rejected.discovery_method = candidate.discovery_method();
            rejected
        } else {
            if !concerns.is_empty() {
                message = format!("{message} (concerns: {})", concerns.join("; "));
            }
            DiscoveryResult::found(target, candidate, status, message)
        };

        result.confidence = Some(breakdown.confidence);
        result.ai_confidence = verification.ai_judged.then_some(verification.ai_confidence);
        result.red_flags = concerns;
        result
    }
}
