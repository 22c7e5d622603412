//! Core domain types and configuration for Instagram handle discovery.
//!
//! Everything downstream (search adapters, the finder pipeline, the CLI)
//! speaks in terms of the types defined here.

pub mod app_config;
pub mod config;
pub mod scoring_config;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, PortkeyConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use scoring_config::{
    load_scoring_config, load_scoring_config_or_default, PenaltyConfig, RegionConfig,
    ScoringConfig,
};
pub use types::{
    AdapterKind, Candidate, ConfidenceScore, DirectorySource, DiscoveryPath, DiscoveryResult,
    DiscoveryStatus, EvidenceBundle, Grade, HtmlCheck, SearchFind, SearchTarget,
    VerificationResult,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read scoring config {path}: {source}")]
    ScoringFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring config: {0}")]
    ScoringFileParse(#[from] serde_yaml::Error),

    #[error("scoring config validation failed: {0}")]
    Validation(String),
}
