use igfind_core::{
    AdapterKind, Candidate, DirectorySource, EvidenceBundle, HtmlCheck, ScoringConfig,
    SearchTarget, VerificationResult,
};
use igfind_search::ProfilePage;

use super::*;
use crate::scoring::ScoringInput;

fn target() -> SearchTarget {
    SearchTarget::new("Joe's Pizza", "123 Main St, Boston, MA 02115")
}

fn strong_evidence() -> EvidenceBundle {
    let mut evidence = EvidenceBundle {
        gmb_profile_found: true,
        ..EvidenceBundle::default()
    };
    evidence.location_matches.insert("boston".to_owned());
    evidence.sources.insert(DirectorySource::Yelp);
    evidence
}

fn candidate(handle: &str, evidence: EvidenceBundle) -> Candidate {
    Candidate::new(handle, AdapterKind::GoogleCustomSearch, evidence).unwrap()
}

fn verification() -> VerificationResult {
    VerificationResult {
        html_check: HtmlCheck::Match,
        ai_judged: false,
        ai_ok: false,
        ai_confidence: 0.0,
        ai_reason: String::new(),
        ai_soft_pass: false,
    }
}

fn profile(title: &str, bio: &str) -> ProfilePage {
    ProfilePage {
        status: 200,
        body: format!(
            r#"<html><head><title>{title}</title><meta property="og:description" content="{bio}"></head><body></body></html>"#
        ),
    }
}

/// Run `rule` against one fixture.
fn apply(
    rule: Rule,
    candidate: &Candidate,
    target: &SearchTarget,
    page: Option<&ProfilePage>,
    base_score: f64,
) -> RuleOutcome {
    let config = ScoringConfig::default();
    let verification = verification();
    let input = ScoringInput {
        candidate,
        target,
        status: DiscoveryStatus::Ok,
        verification: &verification,
        page,
    };
    let mut ctx = RuleContext::new(&config, &input);
    ctx.base_score = base_score;
    rule(&ctx)
}

#[test]
fn corporate_path_scores_half_of_primary() {
    let primary = candidate("joespizza", EvidenceBundle::default());
    let corporate = primary.clone().on_path(DiscoveryPath::Corporate);
    let t = target();
    let a = apply(discovery_method, &primary, &t, None, 0.0);
    let b = apply(discovery_method, &corporate, &t, None, 0.0);
    assert!((a.delta - 30.0).abs() < f64::EPSILON);
    assert!((b.delta - 15.0).abs() < f64::EPSILON);
}

#[test]
fn clean_handle_gets_full_quality_points() {
    let outcome = apply(
        handle_quality,
        &candidate("joespizza", EvidenceBundle::default()),
        &target(),
        None,
        0.0,
    );
    assert!((outcome.delta - 25.0).abs() < 1e-9, "got {}", outcome.delta);
}

#[test]
fn spammy_handle_loses_quality_points() {
    let clean = apply(
        handle_quality,
        &candidate("joespizza", EvidenceBundle::default()),
        &target(),
        None,
        0.0,
    );
    let padded = apply(
        handle_quality,
        &candidate("joes.pizza_fan_2024", EvidenceBundle::default()),
        &target(),
        None,
        0.0,
    );
    assert!(padded.delta < clean.delta);
}

#[test]
fn name_similarity_is_bounded() {
    let t = target();
    let exact = apply(name_similarity, &candidate("joespizza", EvidenceBundle::default()), &t, None, 0.0);
    let unrelated = apply(name_similarity, &candidate("tacotuesday", EvidenceBundle::default()), &t, None, 0.0);
    assert!(exact.delta <= 20.0 && exact.delta > 19.0, "got {}", exact.delta);
    assert!(unrelated.delta < exact.delta);
    assert!(unrelated.delta >= 0.0);
}

#[test]
fn existence_gives_partial_credit_when_rate_limited() {
    let c = candidate("joespizza", EvidenceBundle::default());
    let t = target();
    let found = profile("Joe's Pizza", "Best pizza in Boston");
    let throttled = ProfilePage {
        status: 429,
        body: String::new(),
    };
    let missing = ProfilePage {
        status: 404,
        body: String::new(),
    };
    assert!((apply(existence, &c, &t, Some(&found), 0.0).delta - 15.0).abs() < f64::EPSILON);
    assert!((apply(existence, &c, &t, Some(&throttled), 0.0).delta - 4.0).abs() < f64::EPSILON);
    assert!(apply(existence, &c, &t, Some(&missing), 0.0).delta.abs() < f64::EPSILON);
}

#[test]
fn low_base_is_flagged_below_seventy() {
    let c = candidate("joespizza", strong_evidence());
    let t = target();
    let low = apply(low_base, &c, &t, None, 60.0);
    assert!((low.red_flags - 1.0).abs() < f64::EPSILON);
    assert!(low.delta < 0.0);
    assert_eq!(apply(low_base, &c, &t, None, 85.0), RuleOutcome::none());
}

#[test]
fn weak_location_evidence_is_flagged() {
    let t = target();
    let weak = apply(weak_location, &candidate("joespizza", EvidenceBundle::default()), &t, None, 90.0);
    assert!((weak.red_flags - 1.0).abs() < f64::EPSILON);
    let strong = apply(weak_location, &candidate("joespizza", strong_evidence()), &t, None, 90.0);
    assert!(strong.concerns.is_empty());
}

#[test]
fn conflicting_region_counts_two_geographic_flags() {
    let c = candidate("joespizza", strong_evidence());
    let page = profile("Joe's Pizza", "Pizza in Soho, London");
    let outcome = apply(conflicting_region, &c, &target(), Some(&page), 90.0);
    assert!((outcome.red_flags - 2.0).abs() < f64::EPSILON);
    assert!((outcome.geographic_flags - 2.0).abs() < f64::EPSILON);
    assert!(outcome.concerns[0].contains("london"));
}

#[test]
fn region_in_own_address_is_not_a_conflict() {
    let c = candidate("joespizza", strong_evidence());
    let brooklyn = SearchTarget::new("Joe's Pizza", "7 Carmine St, Brooklyn, NY 11201");
    let page = profile("Joe's Pizza", "Slices in Brooklyn since 1975");
    let outcome = apply(conflicting_region, &c, &brooklyn, Some(&page), 90.0);
    assert_eq!(outcome, RuleOutcome::none());
}

#[test]
fn geographic_checks_skip_without_profile_text() {
    let c = candidate("joespizza", strong_evidence());
    let throttled = ProfilePage {
        status: 429,
        body: String::new(),
    };
    assert_eq!(
        apply(conflicting_region, &c, &target(), Some(&throttled), 90.0),
        RuleOutcome::none()
    );
    assert_eq!(
        apply(missing_region, &c, &target(), Some(&throttled), 90.0),
        RuleOutcome::none()
    );
}

#[test]
fn missing_expected_region_is_one_geographic_flag() {
    let c = candidate("joespizza", strong_evidence());
    let page = profile("Joe's Pizza", "Best pizza in town");
    let outcome = apply(missing_region, &c, &target(), Some(&page), 90.0);
    assert!((outcome.geographic_flags - 1.0).abs() < f64::EPSILON);

    let local = profile("Joe's Pizza", "Best pizza in Boston");
    assert_eq!(
        apply(missing_region, &c, &target(), Some(&local), 90.0),
        RuleOutcome::none()
    );
}

#[test]
fn uninformative_bio_collects_fractional_flags() {
    let c = candidate("joespizza", strong_evidence());
    let page = profile("Joe's Pizza", "Follow for updates");
    let outcome = apply(bio_content, &c, &target(), Some(&page), 90.0);
    assert!((outcome.red_flags - 1.5).abs() < f64::EPSILON);
    assert_eq!(outcome.concerns.len(), 3);
    assert!((outcome.delta + 11.0).abs() < f64::EPSILON);
}

#[test]
fn informative_bio_is_clean() {
    let c = candidate("joespizza", strong_evidence());
    let page = profile("Joe's Pizza", "Joe's Pizza, 123 Main St, Boston. Slices and delivery.");
    assert_eq!(
        apply(bio_content, &c, &target(), Some(&page), 90.0),
        RuleOutcome::none()
    );
}

#[test]
fn words_containing_food_keywords_are_not_food() {
    let c = candidate("joespizza", strong_evidence());
    let page = profile("Joe's Pizza", "Great barber and theater tickets, 123 Main St, Boston");
    let outcome = apply(bio_content, &c, &target(), Some(&page), 90.0);
    assert!(
        outcome.concerns.iter().any(|c| c == "bio has no food keywords"),
        "{:?}",
        outcome.concerns
    );
}

#[test]
fn handle_missing_name_words_is_penalized() {
    let outcome = apply(
        handle_pattern,
        &candidate("tastybites", strong_evidence()),
        &target(),
        None,
        90.0,
    );
    assert!((outcome.red_flags - 1.0).abs() < f64::EPSILON);
    assert!((outcome.delta + 10.0).abs() < f64::EPSILON);
}

#[test]
fn regional_handle_earns_a_bonus() {
    let t = target();
    let regional = apply(regional_handle, &candidate("joespizzaboston", strong_evidence()), &t, None, 90.0);
    assert!((regional.delta - 3.0).abs() < f64::EPSILON);
    assert!(regional.red_flags.abs() < f64::EPSILON);
    let plain = apply(regional_handle, &candidate("joespizza", strong_evidence()), &t, None, 90.0);
    assert_eq!(plain, RuleOutcome::none());
}

#[test]
fn authenticity_claims_are_suspicious() {
    let outcome = apply(
        suspicious_handle,
        &candidate("joespizza_official", strong_evidence()),
        &target(),
        None,
        90.0,
    );
    assert!((outcome.red_flags - 1.0).abs() < f64::EPSILON);
    assert!(outcome.concerns[0].contains("_official"));
}

#[test]
fn red_flag_rules_never_raise_the_score_when_flagging() {
    let c = candidate("real_pizza_official", EvidenceBundle::default());
    let page = profile("Pizza", "Follow for updates from London");
    for (name, rule) in RED_FLAG_RULES {
        let outcome = apply(*rule, &c, &target(), Some(&page), 50.0);
        if outcome.red_flags > 0.0 {
            assert!(outcome.delta < 0.0, "{name} flagged without a penalty");
        }
    }
}
