//! LLM-with-browsing adapter: a Responses API call with web search, followed
//! by a cheap chat call that pulls the bare handle out of the answer.

use igfind_core::{AdapterKind, DirectorySource, EvidenceBundle, SearchFind, SearchTarget};

use crate::error::SearchError;
use crate::handle::parse_model_handle;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::location::{location_tokens, matched_tokens};
use crate::text::truncate_chars;

#[derive(Debug, Clone)]
pub struct GptWebSearch {
    llm: LlmClient,
    search_model: String,
    extraction_model: String,
}

fn search_prompt(target: &SearchTarget) -> String {
    format!(
        "Find the Instagram handle for this specific restaurant location.\n\n\
         Restaurant: {name}\n\
         Address: {address}\n\
         Phone: {phone}\n\n\
         Check these sources for social media links:\n\
         1. The restaurant's official website\n\
         2. Yelp business profile\n\
         3. TripAdvisor listing\n\
         4. Google Business / Maps listing\n\
         5. OpenTable profile\n\
         6. The restaurant's Facebook page\n\n\
         Look for Instagram icons, @username mentions and instagram.com/username URLs. \
         Prefer the account for this location over a brand-wide corporate account.\n\n\
         Return the exact Instagram handle (without @), or NOT_FOUND if this location \
         has no Instagram account.",
        name = target.restaurant_name,
        address = target.address,
        phone = target.phone_str(),
    )
}

fn extraction_prompt(answer: &str) -> String {
    format!(
        "The following is a web search result about a restaurant's Instagram handle:\n\n\
         {answer}\n\n\
         Extract ONLY the Instagram handle. Return just the handle without the @ symbol, \
         or NOT_FOUND if no handle is given.\n\nHandle only (no explanation):"
    )
}

impl GptWebSearch {
    #[must_use]
    pub fn new(llm: LlmClient, search_model: &str, extraction_model: &str) -> Self {
        Self {
            llm,
            search_model: search_model.to_string(),
            extraction_model: extraction_model.to_string(),
        }
    }

    /// # Errors
    ///
    /// Any LLM failure, including [`SearchError::RateLimited`].
    pub async fn search(&self, target: &SearchTarget) -> Result<SearchFind, SearchError> {
        let prompt = search_prompt(target);
        let answer = self.llm.web_search(&self.search_model, &prompt).await?;
        tracing::debug!(
            restaurant = %target.restaurant_name,
            answer = truncate_chars(&answer, 200),
            "gpt web search answered"
        );

        let evidence = evidence_from_answer(&answer, target);

        if answer.trim().eq_ignore_ascii_case("NOT_FOUND") {
            return Ok(SearchFind::Nothing(evidence));
        }

        let request = ChatRequest::new(
            &self.extraction_model,
            vec![ChatMessage::user(extraction_prompt(&answer))],
        )
        .max_tokens(50);
        let extracted = self.llm.chat(&request).await?;

        Ok(SearchFind::from_handle(
            parse_model_handle(&extracted).as_deref(),
            AdapterKind::GptWebSearch,
            evidence,
        ))
    }
}

/// Directory mentions and address tokens in the model's answer.
fn evidence_from_answer(answer: &str, target: &SearchTarget) -> EvidenceBundle {
    let lower = answer.to_lowercase();
    let mut evidence = EvidenceBundle {
        queries_used: vec![format!("gpt_web_search: {}", target.restaurant_name)],
        snippets: vec![truncate_chars(answer, 500).to_string()],
        ..EvidenceBundle::default()
    };
    if lower.contains("yelp") {
        evidence.sources.insert(DirectorySource::Yelp);
    }
    if lower.contains("tripadvisor") {
        evidence.sources.insert(DirectorySource::TripAdvisor);
    }
    if lower.contains("google business") || lower.contains("google maps") {
        evidence.sources.insert(DirectorySource::Google);
    }
    if lower.contains("instagram.com") {
        evidence.sources.insert(DirectorySource::Instagram);
    }
    evidence.location_matches = matched_tokens(answer, &location_tokens(&target.address));
    evidence
}
