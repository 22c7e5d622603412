//! Pulling Instagram handles out of URLs, free text and model answers.

use std::sync::LazyLock;

use igfind_core::types::normalize_handle;
use regex::Regex;

/// First path segments on instagram.com that are not profiles.
pub const EXCLUDED_PATHS: &[&str] = &[
    "p", "reel", "reels", "tv", "stories", "explore", "accounts", "direct",
];

pub const MIN_HANDLE_LEN: usize = 3;
pub const MAX_HANDLE_LEN: usize = 30;

static PROFILE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.|m\.)?instagram\.com/([A-Za-z0-9._]+)")
        .expect("valid instagram url regex")
});

static AT_HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(:])@([A-Za-z0-9._]{2,30})").expect("valid at-handle regex")
});

fn accept(segment: &str) -> Option<String> {
    if EXCLUDED_PATHS.contains(&segment.to_lowercase().as_str()) {
        return None;
    }
    normalize_handle(segment)
}

/// The profile handle of an `instagram.com/<handle>` URL, if it is one.
#[must_use]
pub fn handle_from_url(url: &str) -> Option<String> {
    let caps = PROFILE_URL_RE.captures(url)?;
    accept(caps.get(1)?.as_str())
}

/// Every distinct profile handle linked from `text`, in order of appearance.
#[must_use]
pub fn handles_in_text(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in PROFILE_URL_RE.captures_iter(text) {
        if let Some(handle) = caps.get(1).and_then(|m| accept(m.as_str())) {
            if !out.iter().any(|h| h.eq_ignore_ascii_case(&handle)) {
                out.push(handle);
            }
        }
    }
    out
}

/// Interpret a model's answer to "what is the handle?".
///
/// Accepts a bare handle, an `@handle` or a profile URL. `NOT_FOUND`, empty
/// answers and handles outside 3–30 characters yield `None`.
#[must_use]
pub fn parse_model_handle(answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() || answer.to_uppercase().contains("NOT_FOUND") {
        return None;
    }

    let raw = if let Some(handle) = handle_from_url(answer) {
        handle
    } else if let Some(caps) = AT_HANDLE_RE.captures(answer) {
        caps.get(1)?.as_str().to_string()
    } else {
        let first_line = answer.lines().next().unwrap_or("");
        let token = first_line.split_whitespace().next().unwrap_or("");
        token
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '.' | ','))
            .to_string()
    };

    let handle = normalize_handle(&raw)?;
    let len = handle.chars().count();
    if (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&len) {
        Some(handle)
    } else {
        None
    }
}
