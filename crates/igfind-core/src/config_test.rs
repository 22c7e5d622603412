use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_returns_error() {
    let result = parse_environment("staging");
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IGFIND_ENV"),
        "expected InvalidEnvVar(IGFIND_ENV), got: {result:?}"
    );
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.scoring_path, PathBuf::from("./config/scoring.yaml"));
    assert!(cfg.openai_api_key.is_none());
    assert!(cfg.portkey.is_none());
    assert!(!cfg.llm_available());
    assert!(cfg.enable_google);
    assert!(cfg.enable_duckduckgo);
    assert!(cfg.enable_corporate_fallback);
    assert!(cfg.use_ai_verification);
    assert_eq!(cfg.ai_verification_model, "gpt-4o-mini");
    assert!((cfg.ai_min_confidence - 0.6).abs() < f32::EPSILON);
    assert_eq!(cfg.web_search_model, "gpt-4o");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.adapter_timeout_secs, 90);
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.rate_limit_cooldown_secs, 60);
    assert_eq!(cfg.rate_limit_max_cooldown_secs, 900);
    assert_eq!(cfg.bulk_max_workers, 6);
    assert!((cfg.starts_per_sec - 1.5).abs() < f64::EPSILON);
    assert_eq!(cfg.snapshot_every, 10);
}

#[test]
fn blank_credentials_are_treated_as_missing() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    map.insert("FIRECRAWL_API_KEY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.openai_api_key.is_none());
    assert!(cfg.firecrawl_api_key.is_none());
}

#[test]
fn portkey_requires_both_keys() {
    let mut map = HashMap::new();
    map.insert("USE_PORTKEY", "true");
    map.insert("PORTKEY_API_KEY", "pk");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PORTKEY_VIRTUAL_KEY"),
        "expected MissingEnvVar(PORTKEY_VIRTUAL_KEY), got: {result:?}"
    );
}

#[test]
fn portkey_enabled_makes_llm_available() {
    let mut map = HashMap::new();
    map.insert("USE_PORTKEY", "yes");
    map.insert("PORTKEY_API_KEY", "pk");
    map.insert("PORTKEY_VIRTUAL_KEY", "vk");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let portkey = cfg.portkey.as_ref().unwrap();
    assert_eq!(portkey.base_url, DEFAULT_PORTKEY_BASE_URL);
    assert!(cfg.llm_available());
}

#[test]
fn invalid_bool_is_rejected() {
    let mut map = HashMap::new();
    map.insert("IGFIND_ENABLE_GOOGLE", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IGFIND_ENABLE_GOOGLE"),
        "expected InvalidEnvVar(IGFIND_ENABLE_GOOGLE), got: {result:?}"
    );
}

#[test]
fn ai_min_confidence_out_of_range_is_rejected() {
    let mut map = HashMap::new();
    map.insert("IGFIND_AI_MIN_CONFIDENCE", "1.5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IGFIND_AI_MIN_CONFIDENCE"),
        "got: {result:?}"
    );
}

#[test]
fn zero_workers_is_rejected() {
    let mut map = HashMap::new();
    map.insert("IGFIND_BULK_MAX_WORKERS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IGFIND_BULK_MAX_WORKERS"),
        "got: {result:?}"
    );
}

#[test]
fn non_positive_start_rate_is_rejected() {
    let mut map = HashMap::new();
    map.insert("IGFIND_STARTS_PER_SEC", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "IGFIND_STARTS_PER_SEC"),
        "got: {result:?}"
    );
}

#[test]
fn overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("IGFIND_ENV", "production");
    map.insert("IGFIND_MAX_RETRIES", "5");
    map.insert("IGFIND_USE_AI_VERIFICATION", "off");
    map.insert("IGFIND_STARTS_PER_SEC", "0.5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.max_retries, 5);
    assert!(!cfg.use_ai_verification);
    assert!((cfg.starts_per_sec - 0.5).abs() < f64::EPSILON);
}

#[test]
fn debug_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-secret-value");
    map.insert("USE_PORTKEY", "true");
    map.insert("PORTKEY_API_KEY", "pk-secret-value");
    map.insert("PORTKEY_VIRTUAL_KEY", "vk-secret-value");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("sk-secret-value"));
    assert!(!debug.contains("pk-secret-value"));
    assert!(!debug.contains("vk-secret-value"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn max_cooldown_below_default_cooldown_is_rejected() {
    let mut map = HashMap::new();
    map.insert("IGFIND_RATE_LIMIT_COOLDOWN_SECS", "120");
    map.insert("IGFIND_RATE_LIMIT_MAX_COOLDOWN_SECS", "60");
    let err = build_app_config(lookup_from_map(&map)).unwrap_err();
    assert!(err.to_string().contains("IGFIND_RATE_LIMIT_MAX_COOLDOWN_SECS"), "{err}");
}
