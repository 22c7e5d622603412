//! The named scoring rules, in the order they run.

use igfind_core::{DiscoveryPath, DiscoveryStatus};
use igfind_search::handle::{MAX_HANDLE_LEN, MIN_HANDLE_LEN};
use igfind_search::location::{location_tokens, matched_tokens, region_indicators};
use igfind_search::text::{
    alnum_lower, contains_food_keyword, contains_phrase, coverage, meaningful_name_words,
    name_words,
};

use super::{RuleContext, RuleOutcome};

pub type Rule = fn(&RuleContext<'_>) -> RuleOutcome;

/// Additive rules; their sum is the base score.
pub const BASE_RULES: &[(&str, Rule)] = &[
    ("discovery_method", discovery_method),
    ("handle_quality", handle_quality),
    ("name_similarity", name_similarity),
    ("existence", existence),
    ("status_bonus", status_bonus),
];

/// Adjustments applied after the base score is known.
pub const RED_FLAG_RULES: &[(&str, Rule)] = &[
    ("low_base", low_base),
    ("weak_location", weak_location),
    ("conflicting_region", conflicting_region),
    ("missing_region", missing_region),
    ("bio_content", bio_content),
    ("handle_pattern", handle_pattern),
    ("regional_handle", regional_handle),
    ("suspicious_handle", suspicious_handle),
];

/// Handle segments typical of fan, backup or impersonation accounts.
const SPAM_SEGMENTS: &[&str] = &["official", "real", "fan", "fans", "fanpage", "backup", "fake"];

const SUSPICIOUS_SUBSTRINGS: &[&str] = &["_official", "_real", "_authentic", "official_", "real_"];

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn discovery_method(ctx: &RuleContext<'_>) -> RuleOutcome {
    RuleOutcome::points(match ctx.candidate.path {
        DiscoveryPath::Primary => 30.0,
        DiscoveryPath::SimplifiedName => 24.0,
        DiscoveryPath::Corporate => 15.0,
    })
}

fn looks_spammy(handle: &str) -> bool {
    let segment_hit = handle
        .split(['.', '_'])
        .any(|segment| SPAM_SEGMENTS.contains(&segment));
    let trailing_digits = handle
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .count();
    segment_hit || handle.contains("official") || trailing_digits >= 3
}

pub fn handle_quality(ctx: &RuleContext<'_>) -> RuleOutcome {
    let handle = ctx.candidate.handle.to_lowercase();
    let len = handle.chars().count();
    let mut points = 0.0;

    if (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&len) {
        points += 8.0;
    }

    let special = handle.chars().filter(|c| matches!(*c, '.' | '_')).count();
    let density = ratio(special, len);
    if density <= 0.2 {
        points += 5.0;
    } else if density <= 0.34 {
        points += 2.0;
    }

    if !looks_spammy(&handle) {
        points += 4.0;
    }

    let fragments = meaningful_name_words(&ctx.target.restaurant_name);
    points += 8.0 * coverage(&fragments, &alnum_lower(&handle));

    RuleOutcome::points(points)
}

pub fn name_similarity(ctx: &RuleContext<'_>) -> RuleOutcome {
    let handle = alnum_lower(&ctx.candidate.handle);
    let name = alnum_lower(&ctx.target.restaurant_name);
    if handle.is_empty() || name.is_empty() {
        return RuleOutcome::none();
    }
    let similarity = strsim::jaro_winkler(&handle, &name);
    let word_coverage = coverage(&name_words(&ctx.target.restaurant_name), &handle);
    RuleOutcome::points(20.0 * (0.5 * similarity + 0.5 * word_coverage))
}

pub fn existence(ctx: &RuleContext<'_>) -> RuleOutcome {
    match ctx.page_status {
        Some(200) => {
            let mut points = 7.0;
            if contains_food_keyword(&ctx.page_text) {
                points += 4.0;
            }
            if ctx.name_in_page {
                points += 4.0;
            }
            RuleOutcome::points(points)
        }
        // Throttled: the handle most likely exists.
        Some(429) => RuleOutcome::points(4.0),
        _ => RuleOutcome::none(),
    }
}

pub fn status_bonus(ctx: &RuleContext<'_>) -> RuleOutcome {
    RuleOutcome::points(match ctx.status {
        DiscoveryStatus::Ok => 10.0,
        DiscoveryStatus::Probable => 5.0,
        DiscoveryStatus::NotFound | DiscoveryStatus::Error => 0.0,
    })
}

pub fn low_base(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.base_score < ctx.config.low_base_score {
        RuleOutcome::flag(
            1.0,
            ctx.config.penalties.low_base,
            format!("low base confidence ({:.0})", ctx.base_score),
        )
    } else {
        RuleOutcome::none()
    }
}

pub fn weak_location(ctx: &RuleContext<'_>) -> RuleOutcome {
    let score = ctx.candidate.evidence.location_score();
    if score < ctx.config.min_location_evidence {
        RuleOutcome::flag(
            1.0,
            ctx.config.penalties.weak_location,
            format!("weak location evidence ({score}/10)"),
        )
    } else {
        RuleOutcome::none()
    }
}

pub fn conflicting_region(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.page_text.is_empty() {
        return RuleOutcome::none();
    }
    let regions = &ctx.config.regions;
    let hits: Vec<&str> = regions
        .conflicting_regions
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .filter(|r| !contains_phrase(&ctx.target.address, r))
        .filter(|r| {
            !regions
                .expected_region_tokens
                .iter()
                .any(|e| e.trim().eq_ignore_ascii_case(r))
        })
        .filter(|r| contains_phrase(&ctx.page_text, r))
        .collect();
    if hits.is_empty() {
        return RuleOutcome::none();
    }
    RuleOutcome::flag(
        2.0,
        ctx.config.penalties.conflicting_region,
        format!("profile mentions another region: {}", hits.join(", ")),
    )
    .geographic()
}

pub fn missing_region(ctx: &RuleContext<'_>) -> RuleOutcome {
    if ctx.page_text.is_empty() {
        return RuleOutcome::none();
    }
    let indicators = region_indicators(
        &ctx.target.address,
        &ctx.config.regions.expected_region_tokens,
    );
    if indicators.is_empty() || indicators.iter().any(|t| contains_phrase(&ctx.page_text, t)) {
        return RuleOutcome::none();
    }
    RuleOutcome::flag(
        1.0,
        ctx.config.penalties.missing_region,
        "profile never mentions the expected region",
    )
    .geographic()
}

pub fn bio_content(ctx: &RuleContext<'_>) -> RuleOutcome {
    let Some(bio) = &ctx.bio else {
        return RuleOutcome::none();
    };
    let penalties = &ctx.config.penalties;
    let mut outcome = RuleOutcome::none();

    let overlap = coverage(&name_words(&ctx.target.restaurant_name), &alnum_lower(bio));
    if overlap < ctx.config.min_bio_name_overlap {
        outcome.push_flag(
            0.5,
            penalties.bio_name_mismatch,
            format!("bio barely mentions the name ({:.0}%)", overlap * 100.0),
        );
    }
    if !contains_food_keyword(bio) {
        outcome.push_flag(0.5, penalties.bio_no_food_keyword, "bio has no food keywords");
    }
    let tokens = location_tokens(&ctx.target.address);
    if !tokens.is_empty() && matched_tokens(bio, &tokens).is_empty() {
        outcome.push_flag(0.5, penalties.bio_no_address, "bio has no address details");
    }
    outcome
}

pub fn handle_pattern(ctx: &RuleContext<'_>) -> RuleOutcome {
    let words = meaningful_name_words(&ctx.target.restaurant_name);
    if words.is_empty() {
        return RuleOutcome::none();
    }
    let covered = coverage(&words, &alnum_lower(&ctx.candidate.handle));
    if covered < ctx.config.min_handle_coverage {
        RuleOutcome::flag(
            1.0,
            ctx.config.penalties.handle_pattern_max * (1.0 - covered),
            format!("handle covers {:.0}% of the name", covered * 100.0),
        )
    } else {
        RuleOutcome::none()
    }
}

pub fn regional_handle(ctx: &RuleContext<'_>) -> RuleOutcome {
    let handle = alnum_lower(&ctx.candidate.handle);
    let regional = region_indicators(
        &ctx.target.address,
        &ctx.config.regions.expected_region_tokens,
    )
    .iter()
    .map(|t| alnum_lower(t))
    .filter(|t| t.len() > 2)
    .any(|t| handle.contains(&t));
    if regional {
        RuleOutcome::points(ctx.config.penalties.regional_handle_bonus)
    } else {
        RuleOutcome::none()
    }
}

pub fn suspicious_handle(ctx: &RuleContext<'_>) -> RuleOutcome {
    let handle = ctx.candidate.handle.to_lowercase();
    match SUSPICIOUS_SUBSTRINGS.iter().find(|s| handle.contains(*s)) {
        Some(hit) => RuleOutcome::flag(
            1.0,
            ctx.config.penalties.suspicious_handle,
            format!("handle claims authenticity ({hit})"),
        ),
        None => RuleOutcome::none(),
    }
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
