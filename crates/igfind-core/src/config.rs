use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, PortkeyConfig};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_PORTKEY_BASE_URL: &str = "https://api.portkey.ai/v1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every credential is optional: a missing key disables the strategy that
/// needs it rather than failing startup. Portkey is the one exception, where
/// `USE_PORTKEY=true` without both keys is an error.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        non_empty(lookup(var).ok()).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { non_empty(lookup(var).ok()) };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_flag(&raw).ok_or_else(|| invalid(var, format!("expected a boolean, got '{raw}'")))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("IGFIND_ENV", "development"))?;
    let log_level = or_default("IGFIND_LOG_LEVEL", "info");
    let scoring_path = PathBuf::from(or_default("IGFIND_SCORING_PATH", "./config/scoring.yaml"));

    let openai_api_key = optional("OPENAI_API_KEY");
    let portkey = if parse_bool("USE_PORTKEY", "false")? {
        Some(PortkeyConfig {
            base_url: or_default("PORTKEY_BASE_URL", DEFAULT_PORTKEY_BASE_URL),
            api_key: require("PORTKEY_API_KEY")?,
            virtual_key: require("PORTKEY_VIRTUAL_KEY")?,
        })
    } else {
        None
    };
    let google_search_api_key = optional("GOOGLE_SEARCH_API_KEY");
    let google_search_cx = optional("GOOGLE_SEARCH_CX");
    let firecrawl_api_key = optional("FIRECRAWL_API_KEY");

    let enable_google = parse_bool("IGFIND_ENABLE_GOOGLE", "true")?;
    let enable_duckduckgo = parse_bool("IGFIND_ENABLE_DUCKDUCKGO", "true")?;
    let enable_corporate_fallback = parse_bool("IGFIND_ENABLE_CORPORATE_FALLBACK", "true")?;
    let use_ai_verification = parse_bool("IGFIND_USE_AI_VERIFICATION", "true")?;

    let ai_verification_model = or_default("IGFIND_AI_VERIFICATION_MODEL", "gpt-4o-mini");
    let ai_min_confidence = parse_f64("IGFIND_AI_MIN_CONFIDENCE", "0.6")?;
    if !(0.0..=1.0).contains(&ai_min_confidence) {
        return Err(invalid(
            "IGFIND_AI_MIN_CONFIDENCE",
            format!("must be within [0, 1], got {ai_min_confidence}"),
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let ai_min_confidence = ai_min_confidence as f32;
    let extraction_model = or_default("IGFIND_EXTRACTION_MODEL", "gpt-4o-mini");
    let web_search_model = or_default("IGFIND_WEB_SEARCH_MODEL", "gpt-4o");

    let request_timeout_secs = parse_u64("IGFIND_REQUEST_TIMEOUT_SECS", "30")?;
    let adapter_timeout_secs = parse_u64("IGFIND_ADAPTER_TIMEOUT_SECS", "90")?;
    let user_agent = or_default("IGFIND_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("IGFIND_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("IGFIND_RETRY_BACKOFF_BASE_MS", "1000")?;
    let rate_limit_cooldown_secs = parse_u64("IGFIND_RATE_LIMIT_COOLDOWN_SECS", "60")?;
    let rate_limit_max_cooldown_secs = parse_u64("IGFIND_RATE_LIMIT_MAX_COOLDOWN_SECS", "900")?;
    if rate_limit_max_cooldown_secs < rate_limit_cooldown_secs {
        return Err(invalid(
            "IGFIND_RATE_LIMIT_MAX_COOLDOWN_SECS",
            format!("must be at least IGFIND_RATE_LIMIT_COOLDOWN_SECS ({rate_limit_cooldown_secs})"),
        ));
    }

    let bulk_max_workers = parse_usize("IGFIND_BULK_MAX_WORKERS", "6")?;
    if bulk_max_workers == 0 {
        return Err(invalid("IGFIND_BULK_MAX_WORKERS", "must be at least 1".to_string()));
    }
    let starts_per_sec = parse_f64("IGFIND_STARTS_PER_SEC", "1.5")?;
    if !starts_per_sec.is_finite() || starts_per_sec <= 0.0 {
        return Err(invalid(
            "IGFIND_STARTS_PER_SEC",
            format!("must be a positive number, got {starts_per_sec}"),
        ));
    }
    let snapshot_every = parse_usize("IGFIND_SNAPSHOT_EVERY", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        scoring_path,
        openai_api_key,
        portkey,
        google_search_api_key,
        google_search_cx,
        firecrawl_api_key,
        enable_google,
        enable_duckduckgo,
        enable_corporate_fallback,
        use_ai_verification,
        ai_verification_model,
        ai_min_confidence,
        extraction_model,
        web_search_model,
        request_timeout_secs,
        adapter_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        rate_limit_cooldown_secs,
        rate_limit_max_cooldown_secs,
        bulk_max_workers,
        starts_per_sec,
        snapshot_every,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "IGFIND_ENV".to_string(),
            reason: format!(
                "unrecognized environment '{other}'; expected one of: development, test, production"
            ),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
