//! Confidence scoring engine.
//!
//! A candidate is scored as an ordered list of named rules, each a pure
//! function of the [`RuleContext`]. The base rules add bounded points
//! (method ≤30, handle quality ≤25, name similarity ≤20, existence ≤15,
//! status ≤10). The red-flag rules then subtract penalties and count flags,
//! a fixed decision boundary decides rejection, and finally the LLM
//! judgment is blended in before grading.
//!
//! Every contribution is kept in the [`ScoreBreakdown`] so a score can be
//! audited rule by rule.

pub mod rules;

use igfind_core::{
    Candidate, ConfidenceScore, DiscoveryStatus, ScoringConfig, SearchTarget, VerificationResult,
};
use igfind_search::ProfilePage;

pub use rules::{Rule, BASE_RULES, RED_FLAG_RULES};

/// Everything one scoring run looks at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub candidate: &'a Candidate,
    pub target: &'a SearchTarget,
    pub status: DiscoveryStatus,
    pub verification: &'a VerificationResult,
    /// The profile page fetched during verification, if the fetch succeeded.
    pub page: Option<&'a ProfilePage>,
}

/// Precomputed view of a [`ScoringInput`] handed to every rule.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub config: &'a ScoringConfig,
    pub candidate: &'a Candidate,
    pub target: &'a SearchTarget,
    pub status: DiscoveryStatus,
    pub page_status: Option<u16>,
    /// Lower-cased visible text plus bio; empty unless the page was found.
    pub page_text: String,
    pub bio: Option<String>,
    pub name_in_page: bool,
    /// Sum of the base rules. Zero while the base rules themselves run.
    pub base_score: f64,
}

impl<'a> RuleContext<'a> {
    #[must_use]
    pub fn new(config: &'a ScoringConfig, input: &ScoringInput<'a>) -> Self {
        let page = input.page.filter(|p| p.is_found());
        let bio = page.and_then(ProfilePage::bio);
        let page_text = page.map_or_else(String::new, |p| {
            let mut text = p.text_lower();
            if let Some(bio) = &bio {
                text.push(' ');
                text.push_str(&bio.to_lowercase());
            }
            text
        });
        Self {
            config,
            candidate: input.candidate,
            target: input.target,
            status: input.status,
            page_status: input.page.map(|p| p.status),
            page_text,
            bio,
            name_in_page: page.is_some_and(|p| p.mentions_name(&input.target.restaurant_name)),
            base_score: 0.0,
        }
    }
}

/// What one rule contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub delta: f64,
    pub red_flags: f64,
    pub geographic_flags: f64,
    pub concerns: Vec<String>,
}

impl RuleOutcome {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn points(delta: f64) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn flag(flags: f64, penalty: f64, concern: impl Into<String>) -> Self {
        let mut outcome = Self::default();
        outcome.push_flag(flags, penalty, concern);
        outcome
    }

    /// Count these flags as geographic too.
    #[must_use]
    pub fn geographic(mut self) -> Self {
        self.geographic_flags = self.red_flags;
        self
    }

    pub fn push_flag(&mut self, flags: f64, penalty: f64, concern: impl Into<String>) {
        self.red_flags += flags;
        self.delta -= penalty.abs();
        self.concerns.push(concern.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub rule: &'static str,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub base: Vec<Contribution>,
    pub base_score: f64,
    pub adjustments: Vec<Contribution>,
    pub red_flags: f64,
    pub geographic_flags: f64,
    /// Base plus red-flag adjustments, clamped to `[0, 100]`.
    pub adjusted_score: f64,
    /// Why the candidate was rejected, if it was.
    pub rejection: Option<String>,
    pub ai_delta: f64,
    pub confidence: ConfidenceScore,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    /// Every concern raised by the red-flag rules, in rule order.
    #[must_use]
    pub fn concerns(&self) -> Vec<String> {
        self.adjustments
            .iter()
            .flat_map(|c| c.outcome.concerns.iter().cloned())
            .collect()
    }
}

fn run_rules(rules: &[(&'static str, Rule)], ctx: &RuleContext<'_>) -> Vec<Contribution> {
    rules
        .iter()
        .map(|(name, rule)| Contribution {
            rule: *name,
            outcome: rule(ctx),
        })
        .collect()
}

/// Score one candidate. Pure: the same input always yields the same breakdown.
#[must_use]
pub fn score(config: &ScoringConfig, input: &ScoringInput<'_>) -> ScoreBreakdown {
    let mut ctx = RuleContext::new(config, input);

    let base = run_rules(BASE_RULES, &ctx);
    let base_score = base
        .iter()
        .map(|c| c.outcome.delta)
        .sum::<f64>()
        .clamp(0.0, 100.0);
    ctx.base_score = base_score;

    let adjustments = run_rules(RED_FLAG_RULES, &ctx);
    let red_flags: f64 = adjustments.iter().map(|c| c.outcome.red_flags).sum();
    let geographic_flags: f64 = adjustments.iter().map(|c| c.outcome.geographic_flags).sum();
    let adjusted_score = (base_score + adjustments.iter().map(|c| c.outcome.delta).sum::<f64>())
        .clamp(0.0, 100.0);

    let rejection = rejection_reason(
        config,
        base_score,
        adjusted_score,
        red_flags,
        geographic_flags,
    );
    let ai_delta = ai_adjustment(config.ai_weight, adjusted_score, input.verification);
    let confidence = ConfidenceScore::with_cutoffs(
        adjusted_score + ai_delta,
        config.grade_high,
        config.grade_medium,
    );

    ScoreBreakdown {
        base,
        base_score,
        adjustments,
        red_flags,
        geographic_flags,
        adjusted_score,
        rejection,
        ai_delta,
        confidence,
    }
}

/// The decision boundary, checked in order: geographic flags, total flags,
/// adjusted score, weak base combined with flags.
#[must_use]
pub fn rejection_reason(
    config: &ScoringConfig,
    base_score: f64,
    adjusted_score: f64,
    red_flags: f64,
    geographic_flags: f64,
) -> Option<String> {
    if geographic_flags >= config.max_geographic_flags {
        Some(format!(
            "geographic conflict ({geographic_flags} geographic red flags)"
        ))
    } else if red_flags >= config.max_red_flags {
        Some(format!("too many red flags ({red_flags})"))
    } else if adjusted_score < config.min_adjusted_score {
        Some(format!(
            "adjusted score {adjusted_score:.1} below {}",
            config.min_adjusted_score
        ))
    } else if base_score < config.weak_base_score && red_flags >= config.weak_base_max_flags {
        Some(format!(
            "weak base score {base_score:.1} with {red_flags} red flags"
        ))
    } else {
        None
    }
}

/// Move the score toward 100 by `weight × confidence` of the headroom when
/// the judge agreed, or toward 0 by `weight × (1 − confidence)` when it did
/// not. No change without a real judgment.
#[must_use]
pub fn ai_adjustment(weight: f64, score: f64, verification: &VerificationResult) -> f64 {
    if !verification.ai_judged {
        return 0.0;
    }
    let confidence = f64::from(verification.ai_confidence).clamp(0.0, 1.0);
    if verification.ai_ok {
        weight * confidence * (100.0 - score)
    } else {
        -(weight * (1.0 - confidence) * score)
    }
}

#[cfg(test)]
#[path = "scoring_test.rs"]
mod tests;
