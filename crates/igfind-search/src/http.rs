use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::SearchError;

/// Shared client construction: request timeout, 10 s connect timeout, UA.
pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, SearchError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Map 429 to [`SearchError::RateLimited`] and any other non-2xx status to
/// [`SearchError::UnexpectedStatus`]. A missing or unparsable `Retry-After`
/// is reported as 0, which leaves the wait to the cooldown's default.
pub(crate) fn check_status(service: &str, response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return Err(SearchError::RateLimited {
            service: service.to_string(),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(SearchError::UnexpectedStatus {
            service: service.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Read a JSON body, keeping the deserialization context in the error.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, SearchError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|source| SearchError::Deserialize {
        context: context.to_string(),
        source,
    })
}
