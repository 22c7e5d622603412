//! OpenAI-compatible LLM client: chat completions and the Responses API
//! with the web-search tool, optionally routed through a Portkey gateway.

use igfind_core::app_config::PortkeyConfig;
use igfind_core::AppConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SearchError;
use crate::http::{build_client, check_status, read_json};
use crate::retry::{retry_with_backoff, RetryPolicy};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const SERVICE: &str = "openai";

#[derive(Clone)]
enum Route {
    OpenAi { api_key: String },
    Portkey { api_key: String, virtual_key: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(model: &str, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.to_string(),
            messages,
            temperature: 0.0,
            max_tokens: 200,
            response_format: None,
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Ask for a JSON object answer.
    #[must_use]
    pub fn json_mode(mut self) -> Self {
        self.response_format = Some(serde_json::json!({ "type": "json_object" }));
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    route: Route,
    retry: RetryPolicy,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let route = match self.route {
            Route::OpenAi { .. } => "openai",
            Route::Portkey { .. } => "portkey",
        };
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("route", &route)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Direct OpenAI client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn openai(api_key: &str, timeout_secs: u64) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout_secs, "igfind/0.1")?,
            base_url: OPENAI_API_URL.to_string(),
            route: Route::OpenAi {
                api_key: api_key.to_string(),
            },
            retry: RetryPolicy::default(),
        })
    }

    /// Client routed through a Portkey gateway.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn portkey(config: &PortkeyConfig, timeout_secs: u64) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout_secs, "igfind/0.1")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            route: Route::Portkey {
                api_key: config.api_key.clone(),
                virtual_key: config.virtual_key.clone(),
            },
            retry: RetryPolicy::default(),
        })
    }

    /// Portkey when enabled, otherwise direct OpenAI; `None` without credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, SearchError> {
        let client = if let Some(portkey) = &config.portkey {
            Self::portkey(portkey, config.request_timeout_secs)?
        } else if let Some(key) = &config.openai_api_key {
            Self::openai(key, config.request_timeout_secs)?
        } else {
            return Ok(None);
        };
        Ok(Some(client.with_retry_policy(RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })))
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn headers(&self) -> Result<HeaderMap, SearchError> {
        let invalid = |_| SearchError::Llm("credential contains invalid header characters".into());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match &self.route {
            Route::OpenAi { api_key } => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?,
                );
            }
            Route::Portkey {
                api_key,
                virtual_key,
            } => {
                headers.insert("x-portkey-api-key", HeaderValue::from_str(api_key).map_err(invalid)?);
                headers.insert(
                    "x-portkey-virtual-key",
                    HeaderValue::from_str(virtual_key).map_err(invalid)?,
                );
            }
        }
        Ok(headers)
    }

    async fn post_json(&self, path: &str, body: &Value, context: &str) -> Result<Value, SearchError> {
        let url = format!("{}/{path}", self.base_url);
        let headers = self.headers()?;
        retry_with_backoff(self.retry, SERVICE, || {
            let url = url.clone();
            let headers = headers.clone();
            async move {
                let response = self.client.post(&url).headers(headers).json(body).send().await?;
                let response = check_status(SERVICE, response)?;
                read_json::<Value>(response, context).await
            }
        })
        .await
    }

    /// Run a chat completion and return the first choice's text.
    ///
    /// # Errors
    ///
    /// Transport, status and parse failures, or [`SearchError::Llm`] when the
    /// answer is empty.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, SearchError> {
        tracing::debug!(model = %request.model, "LLM chat request");
        let body = serde_json::to_value(request).map_err(|source| SearchError::Deserialize {
            context: "chat request".to_string(),
            source,
        })?;
        let raw = self.post_json("chat/completions", &body, "chat completion").await?;
        let parsed: ChatResponse =
            serde_json::from_value(raw).map_err(|source| SearchError::Deserialize {
                context: "chat completion".to_string(),
                source,
            })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SearchError::Llm("empty chat completion".to_string()))
    }

    /// Ask a model with the web-search tool enabled (Responses API).
    ///
    /// # Errors
    ///
    /// Transport, status and parse failures, or [`SearchError::Llm`] when no
    /// output text is present.
    pub async fn web_search(&self, model: &str, input: &str) -> Result<String, SearchError> {
        tracing::debug!(model, "LLM web search request");
        let body = serde_json::json!({
            "model": model,
            "tools": [{ "type": "web_search_preview" }],
            "input": input,
        });
        let raw = self.post_json("responses", &body, "responses api").await?;
        response_output_text(&raw)
            .ok_or_else(|| SearchError::Llm("responses api returned no output text".to_string()))
    }
}

/// Text of a Responses API payload: `output_text` when present, otherwise the
/// concatenated `output[].content[].text` parts.
fn response_output_text(raw: &Value) -> Option<String> {
    if let Some(text) = raw.get("output_text").and_then(Value::as_str) {
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    let parts: Vec<&str> = raw
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .collect();
    let joined = parts.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Slice out the outermost `{...}` of a model answer, tolerating prose or
/// code fences around it.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
