use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Portkey gateway settings; when present, every LLM call is routed through
/// the gateway instead of hitting OpenAI directly.
#[derive(Clone, PartialEq, Eq)]
pub struct PortkeyConfig {
    pub base_url: String,
    pub api_key: String,
    pub virtual_key: String,
}

impl std::fmt::Debug for PortkeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortkeyConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("virtual_key", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub scoring_path: PathBuf,

    pub openai_api_key: Option<String>,
    pub portkey: Option<PortkeyConfig>,
    pub google_search_api_key: Option<String>,
    pub google_search_cx: Option<String>,
    pub firecrawl_api_key: Option<String>,

    pub enable_google: bool,
    pub enable_duckduckgo: bool,
    pub enable_corporate_fallback: bool,
    pub use_ai_verification: bool,

    pub ai_verification_model: String,
    pub ai_min_confidence: f32,
    pub extraction_model: String,
    pub web_search_model: String,

    pub request_timeout_secs: u64,
    pub adapter_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub rate_limit_cooldown_secs: u64,
    /// Upper bound on any single cooldown, whatever `Retry-After` says.
    pub rate_limit_max_cooldown_secs: u64,

    pub bulk_max_workers: usize,
    pub starts_per_sec: f64,
    pub snapshot_every: usize,
}

impl AppConfig {
    /// Whether any LLM route (direct or via Portkey) is configured.
    #[must_use]
    pub fn llm_available(&self) -> bool {
        self.openai_api_key.is_some() || self.portkey.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("scoring_path", &self.scoring_path)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("portkey", &self.portkey)
            .field(
                "google_search_api_key",
                &self.google_search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("google_search_cx", &self.google_search_cx)
            .field(
                "firecrawl_api_key",
                &self.firecrawl_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("enable_google", &self.enable_google)
            .field("enable_duckduckgo", &self.enable_duckduckgo)
            .field("enable_corporate_fallback", &self.enable_corporate_fallback)
            .field("use_ai_verification", &self.use_ai_verification)
            .field("ai_verification_model", &self.ai_verification_model)
            .field("ai_min_confidence", &self.ai_min_confidence)
            .field("extraction_model", &self.extraction_model)
            .field("web_search_model", &self.web_search_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("adapter_timeout_secs", &self.adapter_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("rate_limit_cooldown_secs", &self.rate_limit_cooldown_secs)
            .field(
                "rate_limit_max_cooldown_secs",
                &self.rate_limit_max_cooldown_secs,
            )
            .field("bulk_max_workers", &self.bulk_max_workers)
            .field("starts_per_sec", &self.starts_per_sec)
            .field("snapshot_every", &self.snapshot_every)
            .finish()
    }
}
