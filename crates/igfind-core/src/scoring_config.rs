use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Score penalties (and the one bonus) applied by the red-flag rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    pub low_base: f64,
    pub weak_location: f64,
    pub conflicting_region: f64,
    pub missing_region: f64,
    pub bio_name_mismatch: f64,
    pub bio_no_food_keyword: f64,
    pub bio_no_address: f64,
    /// Scaled by the share of name words missing from the handle.
    pub handle_pattern_max: f64,
    pub suspicious_handle: f64,
    pub regional_handle_bonus: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            low_base: 5.0,
            weak_location: 5.0,
            conflicting_region: 20.0,
            missing_region: 5.0,
            bio_name_mismatch: 5.0,
            bio_no_food_keyword: 3.0,
            bio_no_address: 3.0,
            handle_pattern_max: 10.0,
            suspicious_handle: 10.0,
            regional_handle_bonus: 3.0,
        }
    }
}

/// Region data for geographic conflict detection.
///
/// `expected_region_tokens` are added to the indicators derived from each
/// target's address. `conflicting_regions` are other major places whose
/// mention in a profile suggests a same-named business elsewhere; entries
/// that also appear in the target's own address are ignored for that target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub expected_region_tokens: Vec<String>,
    pub conflicting_regions: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        let conflicting = [
            "london",
            "new york",
            "nyc",
            "brooklyn",
            "los angeles",
            "chicago",
            "miami",
            "san francisco",
            "seattle",
            "las vegas",
            "toronto",
            "paris",
            "dubai",
            "sydney",
            "houston",
            "dallas",
            "atlanta",
            "philadelphia",
        ];
        Self {
            expected_region_tokens: Vec::new(),
            conflicting_regions: conflicting.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub grade_high: f64,
    pub grade_medium: f64,
    pub max_red_flags: f64,
    pub max_geographic_flags: f64,
    pub min_adjusted_score: f64,
    pub low_base_score: f64,
    /// Combined with `weak_base_max_flags`: a weak base score plus this many
    /// flags is rejected even below `max_red_flags`.
    pub weak_base_score: f64,
    pub weak_base_max_flags: f64,
    pub min_location_evidence: u8,
    pub min_bio_name_overlap: f64,
    pub min_handle_coverage: f64,
    pub ai_weight: f64,
    pub penalties: PenaltyConfig,
    pub regions: RegionConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            grade_high: 80.0,
            grade_medium: 50.0,
            max_red_flags: 3.0,
            max_geographic_flags: 2.0,
            min_adjusted_score: 40.0,
            low_base_score: 70.0,
            weak_base_score: 65.0,
            weak_base_max_flags: 2.0,
            min_location_evidence: 2,
            min_bio_name_overlap: 0.5,
            min_handle_coverage: 0.5,
            ai_weight: 0.3,
            penalties: PenaltyConfig::default(),
            regions: RegionConfig::default(),
        }
    }
}

/// Load and validate the scoring configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scoring_config(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ScoringFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ScoringConfig =
        serde_yaml::from_str(&content).map_err(ConfigError::ScoringFileParse)?;

    validate_scoring_config(&config)?;

    Ok(config)
}

/// Like [`load_scoring_config`], but a missing file yields the defaults.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but is unreadable or invalid.
pub fn load_scoring_config_or_default(path: &Path) -> Result<ScoringConfig, ConfigError> {
    if path.exists() {
        load_scoring_config(path)
    } else {
        Ok(ScoringConfig::default())
    }
}

fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    let in_score_range = |v: f64| (0.0..=100.0).contains(&v);
    let in_unit_range = |v: f64| (0.0..=1.0).contains(&v);

    if !in_score_range(config.grade_high) || !in_score_range(config.grade_medium) {
        return Err(ConfigError::Validation(
            "grade cutoffs must be within [0, 100]".to_string(),
        ));
    }
    if config.grade_medium >= config.grade_high {
        return Err(ConfigError::Validation(format!(
            "grade_medium ({}) must be below grade_high ({})",
            config.grade_medium, config.grade_high
        )));
    }
    for (name, value) in [
        ("min_adjusted_score", config.min_adjusted_score),
        ("low_base_score", config.low_base_score),
        ("weak_base_score", config.weak_base_score),
    ] {
        if !in_score_range(value) {
            return Err(ConfigError::Validation(format!(
                "{name} must be within [0, 100], got {value}"
            )));
        }
    }
    for (name, value) in [
        ("max_red_flags", config.max_red_flags),
        ("max_geographic_flags", config.max_geographic_flags),
        ("weak_base_max_flags", config.weak_base_max_flags),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }
    for (name, value) in [
        ("ai_weight", config.ai_weight),
        ("min_bio_name_overlap", config.min_bio_name_overlap),
        ("min_handle_coverage", config.min_handle_coverage),
    ] {
        if !in_unit_range(value) {
            return Err(ConfigError::Validation(format!(
                "{name} must be within [0, 1], got {value}"
            )));
        }
    }

    let p = &config.penalties;
    for (name, value) in [
        ("low_base", p.low_base),
        ("weak_location", p.weak_location),
        ("conflicting_region", p.conflicting_region),
        ("missing_region", p.missing_region),
        ("bio_name_mismatch", p.bio_name_mismatch),
        ("bio_no_food_keyword", p.bio_no_food_keyword),
        ("bio_no_address", p.bio_no_address),
        ("handle_pattern_max", p.handle_pattern_max),
        ("suspicious_handle", p.suspicious_handle),
        ("regional_handle_bonus", p.regional_handle_bonus),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "penalty '{name}' must be a non-negative number, got {value}"
            )));
        }
    }

    if config
        .regions
        .conflicting_regions
        .iter()
        .chain(&config.regions.expected_region_tokens)
        .any(|r| r.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "region entries must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_scoring_config(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let file = write_yaml(
            "grade_high: 85\nregions:\n  expected_region_tokens: [\"back bay\", \"cambridge\"]\n",
        );
        let cfg = load_scoring_config(file.path()).unwrap();
        assert!((cfg.grade_high - 85.0).abs() < f64::EPSILON);
        assert!((cfg.grade_medium - 50.0).abs() < f64::EPSILON);
        assert_eq!(cfg.regions.expected_region_tokens, vec!["back bay", "cambridge"]);
        assert_eq!(
            cfg.regions.conflicting_regions,
            RegionConfig::default().conflicting_regions
        );
        assert!((cfg.penalties.conflicting_region - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_grade_cutoffs_fail_validation() {
        let file = write_yaml("grade_high: 50\ngrade_medium: 60\n");
        let result = load_scoring_config(file.path());
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("grade_medium")),
            "got: {result:?}"
        );
    }

    #[test]
    fn ai_weight_out_of_range_fails_validation() {
        let file = write_yaml("ai_weight: 1.5\n");
        let result = load_scoring_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))), "got: {result:?}");
    }

    #[test]
    fn negative_penalty_fails_validation() {
        let file = write_yaml("penalties:\n  conflicting_region: -1\n");
        let result = load_scoring_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))), "got: {result:?}");
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let file = write_yaml("grade_high: [not a number\n");
        let result = load_scoring_config(file.path());
        assert!(matches!(result, Err(ConfigError::ScoringFileParse(_))), "got: {result:?}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_scoring_config(Path::new("/nonexistent/scoring.yaml"));
        assert!(matches!(result, Err(ConfigError::ScoringFileIo { .. })), "got: {result:?}");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_scoring_config_or_default(Path::new("/nonexistent/scoring.yaml")).unwrap();
        assert_eq!(cfg, ScoringConfig::default());
    }
}
