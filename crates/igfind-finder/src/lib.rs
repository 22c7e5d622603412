//! Instagram handle discovery for restaurant locations.
//!
//! Runs the search adapters in priority order, verifies each candidate
//! against the public profile page and an LLM judge, scores the survivor
//! with named rules and red flags, and produces one [`DiscoveryResult`]
//! per target. The bulk runner fans this out over a worker pool.

pub mod bulk;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod pipeline;
pub mod review;
pub mod scoring;
pub mod verify;

pub use bulk::{run_batch, BatchOutcome, BulkOptions};
pub use error::FinderError;
pub use orchestrator::{Discovery, Orchestrator};
pub use pipeline::Finder;
pub use review::{apply_review_flags, REVIEW_FLAG};
pub use scoring::{score, ScoreBreakdown, ScoringInput};
pub use verify::{PlausibilityJudge, Verification, Verifier};

pub use igfind_core::{DiscoveryResult, SearchTarget};
