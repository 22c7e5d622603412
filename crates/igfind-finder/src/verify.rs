//! Verification layer: a profile-page keyword check plus an LLM plausibility
//! judgment. Either one passing accepts the candidate into scoring.

use igfind_core::{
    Candidate, DirectorySource, EvidenceBundle, HtmlCheck, SearchTarget, VerificationResult,
};
use igfind_search::llm::{extract_json_object, ChatMessage, ChatRequest};
use igfind_search::location::{location_tokens, matched_tokens};
use igfind_search::{LlmClient, ProfileFetcher, ProfilePage, RateLimitCooldown, SearchError};
use serde::Deserialize;

/// Outcome of verifying one candidate, with the profile page that was
/// fetched so scoring can reuse it.
#[derive(Debug, Clone)]
pub struct Verification {
    pub result: VerificationResult,
    /// `None` when the fetch failed at the network level.
    pub page: Option<ProfilePage>,
    /// What the profile page itself says about the location.
    pub evidence: EvidenceBundle,
}

/// The structured answer the judge model is asked for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Judgment {
    #[serde(default)]
    pub plausible: bool,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub reason: String,
}

/// Parse the judge's answer, tolerating prose or code fences around the JSON.
///
/// # Errors
///
/// [`SearchError::Llm`] when no JSON object is present,
/// [`SearchError::Deserialize`] when it does not match [`Judgment`].
pub fn parse_judgment(answer: &str) -> Result<Judgment, SearchError> {
    let json = extract_json_object(answer)
        .ok_or_else(|| SearchError::Llm("judge answer contained no JSON object".to_string()))?;
    let mut judgment: Judgment =
        serde_json::from_str(json).map_err(|source| SearchError::Deserialize {
            context: "plausibility judgment".to_string(),
            source,
        })?;
    judgment.confidence = if judgment.confidence.is_nan() {
        0.0
    } else {
        judgment.confidence.clamp(0.0, 1.0)
    };
    Ok(judgment)
}

/// Map a profile fetch to the lightweight check.
#[must_use]
pub fn html_check(page: Option<&ProfilePage>, restaurant_name: &str) -> HtmlCheck {
    let Some(page) = page else {
        return HtmlCheck::Inconclusive;
    };
    match page.status {
        200 if page.mentions_name(restaurant_name) => HtmlCheck::Match,
        200 => HtmlCheck::Mismatch,
        404 => HtmlCheck::NotFound,
        429 => HtmlCheck::RateLimited,
        _ => HtmlCheck::Inconclusive,
    }
}

/// Address tokens found in the profile's bio and visible text.
#[must_use]
pub fn profile_evidence(page: Option<&ProfilePage>, target: &SearchTarget) -> EvidenceBundle {
    let mut evidence = EvidenceBundle::default();
    let Some(page) = page.filter(|p| p.is_found()) else {
        return evidence;
    };
    evidence.sources.insert(DirectorySource::Instagram);
    let text = match page.bio() {
        Some(bio) => format!("{bio} {}", page.text_lower()),
        None => page.text_lower(),
    };
    evidence.location_matches = matched_tokens(&text, &location_tokens(&target.address));
    evidence
}

fn judge_prompt(target: &SearchTarget, handle: &str) -> String {
    let address = if target.address.is_empty() {
        "(not given)"
    } else {
        target.address.as_str()
    };
    format!(
        "Merchant: {name}\n\
         Address: {address}\n\
         Candidate Instagram: @{handle}\n\n\
         Does this Instagram handle plausibly represent this specific merchant location?\n\
         Prefer accounts for this location over brand-wide corporate accounts: a chain's \
         corporate account is only acceptable when the location has none of its own, and \
         should get a lower confidence. Consider what you know about the brand and typical \
         naming. Return JSON only:\n\
         {{\"plausible\": true|false, \"confidence\": 0.0-1.0, \"reason\": \"short\"}}",
        name = target.restaurant_name,
    )
}

/// The LLM plausibility judge.
#[derive(Debug, Clone)]
pub struct PlausibilityJudge {
    llm: LlmClient,
    model: String,
    min_confidence: f32,
}

impl PlausibilityJudge {
    #[must_use]
    pub fn new(llm: LlmClient, model: &str, min_confidence: f32) -> Self {
        Self {
            llm,
            model: model.to_string(),
            min_confidence,
        }
    }

    /// # Errors
    ///
    /// Any LLM transport, status or parse failure.
    pub async fn judge(
        &self,
        target: &SearchTarget,
        handle: &str,
    ) -> Result<Judgment, SearchError> {
        let request = ChatRequest::new(
            &self.model,
            vec![ChatMessage::user(judge_prompt(target, handle))],
        )
        .temperature(0.1)
        .max_tokens(200)
        .json_mode();
        let answer = self.llm.chat(&request).await?;
        parse_judgment(&answer)
    }

    #[must_use]
    pub fn accepts(&self, judgment: &Judgment) -> bool {
        judgment.plausible && judgment.confidence >= self.min_confidence
    }
}

#[derive(Debug, Clone)]
pub struct Verifier {
    profiles: ProfileFetcher,
    judge: Option<PlausibilityJudge>,
    cooldown: Option<RateLimitCooldown>,
}

impl Verifier {
    /// A verifier without a judge relies on the profile check alone.
    #[must_use]
    pub fn new(profiles: ProfileFetcher, judge: Option<PlausibilityJudge>) -> Self {
        Self {
            profiles,
            judge,
            cooldown: None,
        }
    }

    /// Trip `cooldown` when the judge model is rate limited.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: RateLimitCooldown) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub async fn verify(&self, candidate: &Candidate, target: &SearchTarget) -> Verification {
        let page = match self.profiles.fetch(&candidate.handle).await {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!(
                    handle = %candidate.handle,
                    error = %e,
                    "profile fetch failed, treating as inconclusive"
                );
                None
            }
        };
        let check = html_check(page.as_ref(), &target.restaurant_name);
        let evidence = profile_evidence(page.as_ref(), target);

        let mut result = VerificationResult {
            html_check: check,
            ai_judged: false,
            ai_ok: false,
            ai_confidence: 0.0,
            ai_reason: String::new(),
            ai_soft_pass: false,
        };

        if let Some(judge) = &self.judge {
            match judge.judge(target, &candidate.handle).await {
                Ok(judgment) => {
                    result.ai_judged = true;
                    result.ai_ok = judge.accepts(&judgment);
                    result.ai_confidence = judgment.confidence;
                    result.ai_reason = judgment.reason;
                }
                Err(e) => {
                    if let Some(cooldown) = &self.cooldown {
                        cooldown.observe(&e);
                    }
                    tracing::warn!(
                        handle = %candidate.handle,
                        error = %e,
                        "plausibility judge unavailable, soft pass"
                    );
                    result.ai_ok = true;
                    result.ai_soft_pass = true;
                    result.ai_reason = format!("AI verify skipped: {e}");
                }
            }
        }

        tracing::debug!(
            handle = %candidate.handle,
            html_check = ?result.html_check,
            ai_ok = result.ai_ok,
            ai_confidence = result.ai_confidence,
            passed = result.passed(),
            "candidate verified"
        );

        Verification {
            result,
            page,
            evidence,
        }
    }
}
