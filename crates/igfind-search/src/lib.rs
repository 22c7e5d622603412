//! External collaborators for Instagram handle discovery.
//!
//! Search adapters (Google Custom Search, GPT web search, Firecrawl,
//! DuckDuckGo, pattern guessing), the public profile fetcher, the
//! OpenAI-compatible LLM client, plus the retry and rate-limit cooldown
//! machinery they share. Every HTTP client accepts a base URL override so
//! tests can point it at a mock server.

pub mod adapters;
pub mod cooldown;
pub mod error;
pub mod handle;
pub mod llm;
pub mod location;
pub mod profile;
pub mod retry;
pub mod text;

mod http;

pub use adapters::SearchAdapter;
pub use cooldown::RateLimitCooldown;
pub use error::SearchError;
pub use llm::LlmClient;
pub use profile::{ProfileFetcher, ProfilePage};
pub use retry::RetryPolicy;
