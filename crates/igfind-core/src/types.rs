//! Domain types shared by every stage of handle discovery.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One restaurant location to find an Instagram handle for.
///
/// Built once per discovery request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    pub restaurant_name: String,
    /// Free text, typically `"street, city, ST zip"`.
    pub address: String,
    pub phone: Option<String>,
    /// Opaque grouping key used by the bulk review-flag pass.
    pub business_id: String,
    pub store_id: String,
}

impl SearchTarget {
    #[must_use]
    pub fn new(restaurant_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            restaurant_name: restaurant_name.into().trim().to_string(),
            address: address.into().trim().to_string(),
            phone: None,
            business_id: String::new(),
            store_id: String::new(),
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        let phone = phone.into().trim().to_string();
        self.phone = if phone.is_empty() { None } else { Some(phone) };
        self
    }

    #[must_use]
    pub fn with_ids(mut self, business_id: impl Into<String>, store_id: impl Into<String>) -> Self {
        self.business_id = business_id.into().trim().to_string();
        self.store_id = store_id.into().trim().to_string();
        self
    }

    /// Same location with a different display name, used by the
    /// simplified-name fallback.
    #[must_use]
    pub fn renamed(&self, restaurant_name: &str) -> Self {
        Self {
            restaurant_name: restaurant_name.trim().to_string(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn phone_str(&self) -> &str {
        self.phone.as_deref().unwrap_or("")
    }
}

/// The discovery channels, in the order the orchestrator tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    GoogleCustomSearch,
    GptWebSearch,
    Firecrawl,
    DuckDuckGo,
    PatternGuess,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::GoogleCustomSearch => write!(f, "google_custom_search"),
            AdapterKind::GptWebSearch => write!(f, "gpt_web_search"),
            AdapterKind::Firecrawl => write!(f, "firecrawl"),
            AdapterKind::DuckDuckGo => write!(f, "duckduckgo"),
            AdapterKind::PatternGuess => write!(f, "pattern_guess"),
        }
    }
}

/// How the orchestrator arrived at a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPath {
    /// Found by a primary strategy using the name as given.
    Primary,
    /// Found after stripping parenthetical qualifiers from the name.
    SimplifiedName,
    /// Brand-wide account used as a last resort.
    Corporate,
}

impl DiscoveryPath {
    #[must_use]
    pub fn is_degraded(self) -> bool {
        !matches!(self, DiscoveryPath::Primary)
    }
}

/// Directory sites a search adapter saw while looking for the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
    Instagram,
    Yelp,
    TripAdvisor,
    Google,
}

impl DirectorySource {
    /// Classify a URL by its host, if it belongs to a known directory.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        if lower.contains("instagram.com") {
            Some(Self::Instagram)
        } else if lower.contains("yelp.com") {
            Some(Self::Yelp)
        } else if lower.contains("tripadvisor.") {
            Some(Self::TripAdvisor)
        } else if lower.contains("google.com") || lower.contains("goo.gl/maps") {
            Some(Self::Google)
        } else {
            None
        }
    }
}

/// Signals an adapter collected in support of its candidate.
///
/// Additive: strategies contribute partial evidence and bundles merge. It is
/// only ever an input to scoring, never authoritative on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub sources: BTreeSet<DirectorySource>,
    /// Lower-cased address-derived tokens (city, state, zip, street words)
    /// that appeared in scraped text.
    pub location_matches: BTreeSet<String>,
    pub gmb_profile_found: bool,
    pub queries_used: Vec<String>,
    /// Raw text kept for debugging only.
    pub snippets: Vec<String>,
}

/// Cap on [`EvidenceBundle::location_score`].
pub const MAX_LOCATION_SCORE: u8 = 10;

impl EvidenceBundle {
    pub fn merge(&mut self, other: EvidenceBundle) {
        self.sources.extend(other.sources);
        self.location_matches.extend(other.location_matches);
        self.gmb_profile_found |= other.gmb_profile_found;
        self.queries_used.extend(other.queries_used);
        self.snippets.extend(other.snippets);
    }

    /// Aggregate location evidence: a Google Business profile is worth 3,
    /// each unique location token 1, Yelp and TripAdvisor presence 1 each.
    /// Capped at [`MAX_LOCATION_SCORE`].
    #[must_use]
    pub fn location_score(&self) -> u8 {
        let mut score: usize = 0;
        if self.gmb_profile_found {
            score += 3;
        }
        score += self.location_matches.len();
        if self.sources.contains(&DirectorySource::Yelp) {
            score += 1;
        }
        if self.sources.contains(&DirectorySource::TripAdvisor) {
            score += 1;
        }
        u8::try_from(score.min(usize::from(MAX_LOCATION_SCORE))).unwrap_or(MAX_LOCATION_SCORE)
    }
}

/// A handle proposed by one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub handle: String,
    pub adapter: AdapterKind,
    pub path: DiscoveryPath,
    pub evidence: EvidenceBundle,
}

impl Candidate {
    /// Returns `None` when the raw handle normalizes to nothing.
    #[must_use]
    pub fn new(raw_handle: &str, adapter: AdapterKind, evidence: EvidenceBundle) -> Option<Self> {
        let handle = normalize_handle(raw_handle)?;
        Some(Self {
            handle,
            adapter,
            path: DiscoveryPath::Primary,
            evidence,
        })
    }

    #[must_use]
    pub fn on_path(mut self, path: DiscoveryPath) -> Self {
        self.path = path;
        self
    }

    /// `adapter` for primary finds, prefixed with the fallback path otherwise.
    #[must_use]
    pub fn discovery_method(&self) -> String {
        match self.path {
            DiscoveryPath::Primary => self.adapter.to_string(),
            DiscoveryPath::SimplifiedName => format!("simplified_name:{}", self.adapter),
            DiscoveryPath::Corporate => format!("corporate:{}", self.adapter),
        }
    }
}

/// What one adapter run produced. Evidence about the target survives even
/// when no handle came out, so later candidates for the same target can
/// build on it.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFind {
    Found(Candidate),
    Nothing(EvidenceBundle),
}

impl SearchFind {
    /// `Found` when `raw_handle` normalizes to something usable, `Nothing`
    /// (keeping the evidence) otherwise.
    #[must_use]
    pub fn from_handle(
        raw_handle: Option<&str>,
        adapter: AdapterKind,
        evidence: EvidenceBundle,
    ) -> Self {
        match raw_handle.and_then(normalize_handle) {
            Some(handle) => Self::Found(Candidate {
                handle,
                adapter,
                path: DiscoveryPath::Primary,
                evidence,
            }),
            None => Self::Nothing(evidence),
        }
    }

    #[must_use]
    pub fn candidate(self) -> Option<Candidate> {
        match self {
            Self::Found(candidate) => Some(candidate),
            Self::Nothing(_) => None,
        }
    }
}

/// Normalize a raw handle to `[a-zA-Z0-9._]`, dropping a leading `@`.
///
/// Returns `None` if nothing usable remains.
#[must_use]
pub fn normalize_handle(raw: &str) -> Option<String> {
    let handle: String = raw
        .trim()
        .trim_start_matches('@')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    let handle = handle.trim_matches('.').to_string();
    if handle.is_empty() {
        None
    } else {
        Some(handle)
    }
}

/// Outcome of the lightweight profile-page check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HtmlCheck {
    /// Page found and enough restaurant-name words appear in it.
    Match,
    /// Page found but the name overlap was too low.
    Mismatch,
    /// HTTP 404.
    NotFound,
    /// HTTP 429; the handle probably exists.
    RateLimited,
    /// Network failure or an unexpected status.
    Inconclusive,
}

impl HtmlCheck {
    #[must_use]
    pub fn passes(self) -> bool {
        matches!(self, HtmlCheck::Match | HtmlCheck::RateLimited)
    }
}

/// Judgment on one candidate from both verification checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub html_check: HtmlCheck,
    /// The model returned a usable judgment. `false` when the judge is
    /// disabled or on a soft pass.
    pub ai_judged: bool,
    pub ai_ok: bool,
    /// In `[0.0, 1.0]`.
    pub ai_confidence: f32,
    pub ai_reason: String,
    /// The LLM could not be reached; `ai_ok` was granted without a judgment.
    pub ai_soft_pass: bool,
}

impl VerificationResult {
    #[must_use]
    pub fn html_ok(&self) -> bool {
        self.html_check.passes()
    }

    /// A candidate is accepted into scoring if either check passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.html_ok() || self.ai_ok
    }

    /// The model judged the candidate and did not find it plausible enough.
    #[must_use]
    pub fn ai_disagrees(&self) -> bool {
        self.ai_judged && !self.ai_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::High => write!(f, "High"),
            Grade::Medium => write!(f, "Medium"),
            Grade::Low => write!(f, "Low"),
        }
    }
}

pub const DEFAULT_GRADE_HIGH: f64 = 80.0;
pub const DEFAULT_GRADE_MEDIUM: f64 = 50.0;

/// A score in `[0, 100]` and the grade derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub value: f64,
    pub grade: Grade,
}

impl ConfidenceScore {
    /// Clamp `value` to `[0, 100]` and grade it with the default cutoffs.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self::with_cutoffs(value, DEFAULT_GRADE_HIGH, DEFAULT_GRADE_MEDIUM)
    }

    #[must_use]
    pub fn with_cutoffs(value: f64, high: f64, medium: f64) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        };
        let grade = if value >= high {
            Grade::High
        } else if value >= medium {
            Grade::Medium
        } else {
            Grade::Low
        };
        Self { value, grade }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Ok,
    Probable,
    NotFound,
    Error,
}

impl std::fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryStatus::Ok => write!(f, "ok"),
            DiscoveryStatus::Probable => write!(f, "probable"),
            DiscoveryStatus::NotFound => write!(f, "not_found"),
            DiscoveryStatus::Error => write!(f, "error"),
        }
    }
}

/// Final output of one discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub business_id: String,
    pub store_id: String,
    pub restaurant_name: String,
    pub address: String,
    pub phone: String,
    /// Empty when nothing was accepted.
    pub instagram_handle: String,
    pub status: DiscoveryStatus,
    pub message: String,
    pub confidence: Option<ConfidenceScore>,
    pub discovery_method: String,
    pub ai_confidence: Option<f32>,
    /// Named concerns raised while scoring.
    pub red_flags: Vec<String>,
    pub processing_time_ms: u64,
    /// `"FLAG"` when the business has inconsistent handles across stores.
    pub review: String,
}

impl DiscoveryResult {
    fn blank(target: &SearchTarget, status: DiscoveryStatus, message: String) -> Self {
        Self {
            business_id: target.business_id.clone(),
            store_id: target.store_id.clone(),
            restaurant_name: target.restaurant_name.clone(),
            address: target.address.clone(),
            phone: target.phone_str().to_string(),
            instagram_handle: String::new(),
            status,
            message,
            confidence: None,
            discovery_method: String::new(),
            ai_confidence: None,
            red_flags: Vec::new(),
            processing_time_ms: 0,
            review: String::new(),
        }
    }

    #[must_use]
    pub fn not_found(target: &SearchTarget, message: impl Into<String>) -> Self {
        Self::blank(target, DiscoveryStatus::NotFound, message.into())
    }

    #[must_use]
    pub fn error(target: &SearchTarget, message: impl Into<String>) -> Self {
        Self::blank(target, DiscoveryStatus::Error, message.into())
    }

    #[must_use]
    pub fn found(
        target: &SearchTarget,
        candidate: &Candidate,
        status: DiscoveryStatus,
        message: impl Into<String>,
    ) -> Self {
        let mut result = Self::blank(target, status, message.into());
        result.instagram_handle.clone_from(&candidate.handle);
        result.discovery_method = candidate.discovery_method();
        result
    }

    #[must_use]
    pub fn has_handle(&self) -> bool {
        !self.instagram_handle.trim().is_empty()
    }
}
