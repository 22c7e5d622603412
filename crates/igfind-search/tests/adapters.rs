//! Integration tests for the search adapters using wiremock HTTP mocks.

use igfind_core::{AdapterKind, DirectorySource, SearchFind, SearchTarget};
use igfind_search::adapters::{
    DuckDuckGoSearch, FirecrawlSearch, GoogleSearch, GptWebSearch, PatternGuess, SearchAdapter,
};
use igfind_search::{LlmClient, ProfileFetcher, RetryPolicy, SearchError};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn joes() -> SearchTarget {
    SearchTarget::new("Joe's Pizza", "123 Main St, Boston, MA 02115")
}

fn llm(base_url: &str) -> LlmClient {
    LlmClient::openai("test-key", 5)
        .expect("client construction should not fail")
        .with_base_url(base_url)
        .with_retry_policy(RetryPolicy::none())
}

fn chat_answer(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    })
}

#[tokio::test]
async fn google_returns_first_profile_link() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "items": [
            {
                "link": "https://www.yelp.com/biz/joes-pizza-boston",
                "title": "Joe's Pizza - Boston - Yelp",
                "snippet": "Best slice in Boston, MA. Follow on instagram."
            },
            {
                "link": "https://www.instagram.com/joespizzaboston/",
                "title": "Joe's Pizza (@joespizzaboston)",
                "snippet": "123 Main St"
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "g-key"))
        .and(query_param("cx", "g-cx"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let google = GoogleSearch::with_base_url("g-key", "g-cx", 5, "test-agent", &server.uri())
        .unwrap()
        .with_retry_policy(RetryPolicy::none());
    let candidate = google.search(&joes()).await.unwrap().candidate().expect("candidate");

    assert_eq!(candidate.handle, "joespizzaboston");
    assert_eq!(candidate.adapter, AdapterKind::GoogleCustomSearch);
    assert!(candidate.evidence.sources.contains(&DirectorySource::Yelp));
    assert!(candidate.evidence.location_matches.contains("boston"));
    assert_eq!(candidate.evidence.queries_used.len(), 1);
}

#[tokio::test]
async fn google_without_profile_links_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let google = GoogleSearch::with_base_url("k", "cx", 5, "ua", &server.uri()).unwrap();
    assert!(google.search(&joes()).await.unwrap().candidate().is_none());
}

#[tokio::test]
async fn google_429_is_rate_limited_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .expect(1)
        .mount(&server)
        .await;

    let google = GoogleSearch::with_base_url("k", "cx", 5, "ua", &server.uri()).unwrap();
    let err = google.search(&joes()).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after_secs(), Some(17));
}

#[tokio::test]
async fn google_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let google = GoogleSearch::with_base_url("k", "cx", 5, "ua", &server.uri())
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 1,
        });
    let err = google.search(&joes()).await.unwrap_err();
    assert!(matches!(err, SearchError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn duckduckgo_decodes_redirect_links() {
    let server = MockServer::start().await;
    let html = r#"<html><body>
        <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.instagram.com%2Fp%2FCxyz%2F&amp;rut=1">post</a>
        <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.instagram.com%2Fjoespizzaboston%2F&amp;rut=2">profile</a>
        </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(&server)
        .await;

    let ddg = DuckDuckGoSearch::with_base_url(5, "ua", &server.uri()).unwrap();
    let candidate = ddg.search(&joes()).await.unwrap().candidate().expect("candidate");
    assert_eq!(candidate.handle, "joespizzaboston");
    assert_eq!(candidate.adapter, AdapterKind::DuckDuckGo);
    assert!(candidate.evidence.sources.contains(&DirectorySource::Instagram));
}

#[tokio::test]
async fn firecrawl_collects_evidence_and_asks_the_model() {
    let server = MockServer::start().await;
    let search_body = serde_json::json!({
        "success": true,
        "data": [
            {
                "url": "https://www.google.com/maps/place/Joe's+Pizza",
                "title": "Joe's Pizza",
                "markdown": "Joe's Pizza, 123 Main St, Boston MA 02115. Open daily."
            },
            {
                "url": "https://www.yelp.com/biz/joes-pizza-boston",
                "title": "Joe's Pizza - Yelp",
                "markdown": "Follow us on Instagram @joespizzaboston"
            }
        ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .and(body_partial_json(serde_json::json!({ "limit": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&search_body))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer("joespizzaboston")))
        .expect(1)
        .mount(&server)
        .await;

    let firecrawl = FirecrawlSearch::new("fc-key", llm(&server.uri()), "gpt-4o-mini", 5)
        .unwrap()
        .with_base_url(&server.uri())
        .with_retry_policy(RetryPolicy::none());
    let candidate = firecrawl.search(&joes()).await.unwrap().candidate().expect("candidate");

    assert_eq!(candidate.handle, "joespizzaboston");
    assert_eq!(candidate.adapter, AdapterKind::Firecrawl);
    assert!(candidate.evidence.gmb_profile_found);
    assert!(candidate.evidence.sources.contains(&DirectorySource::Yelp));
    assert!(candidate.evidence.location_matches.contains("boston"));
    assert!(candidate.evidence.location_matches.contains("02115"));
    // Two hits per query, five blocks needed: three queries run.
    assert_eq!(candidate.evidence.queries_used.len(), 3);
}

#[tokio::test]
async fn firecrawl_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let firecrawl = FirecrawlSearch::new("fc-key", llm(&server.uri()), "gpt-4o-mini", 5)
        .unwrap()
        .with_base_url(&server.uri());
    let err = firecrawl.search(&joes()).await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn firecrawl_not_found_answer_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "url": "https://example.com", "markdown": "Pizza menu" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer("NOT_FOUND")))
        .mount(&server)
        .await;

    let firecrawl = FirecrawlSearch::new("fc-key", llm(&server.uri()), "gpt-4o-mini", 5)
        .unwrap()
        .with_base_url(&server.uri())
        .with_retry_policy(RetryPolicy::none());
    let SearchFind::Nothing(evidence) = firecrawl.search(&joes()).await.unwrap() else {
        panic!("expected no candidate");
    };
    assert_eq!(evidence.queries_used.len(), 5);
    assert!(!evidence.snippets.is_empty());
}

#[tokio::test]
async fn firecrawl_linked_profile_without_content_skips_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "url": "https://www.instagram.com/joespizzaboston/" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer("NOT_FOUND")))
        .expect(0)
        .mount(&server)
        .await;

    let firecrawl = FirecrawlSearch::new("fc-key", llm(&server.uri()), "gpt-4o-mini", 5)
        .unwrap()
        .with_base_url(&server.uri())
        .with_retry_policy(RetryPolicy::none());
    let candidate = firecrawl
        .search(&joes())
        .await
        .unwrap()
        .candidate()
        .expect("linked profile");
    assert_eq!(candidate.handle, "joespizzaboston");
    assert!(candidate.evidence.sources.contains(&DirectorySource::Instagram));
}

#[tokio::test]
async fn gpt_web_search_extracts_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o",
            "tools": [{ "type": "web_search_preview" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": [{
                "type": "message",
                "content": [{
                    "type": "output_text",
                    "text": "According to their Yelp page, the Boston shop posts as @joespizzaboston."
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_answer("joespizzaboston")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SearchAdapter::GptWeb(GptWebSearch::new(
        llm(&server.uri()),
        "gpt-4o",
        "gpt-4o-mini",
    ));
    assert_eq!(adapter.kind(), AdapterKind::GptWebSearch);
    let candidate = adapter.search(&joes()).await.unwrap().candidate().expect("candidate");
    assert_eq!(candidate.handle, "joespizzaboston");
    assert!(candidate.evidence.sources.contains(&DirectorySource::Yelp));
}

#[tokio::test]
async fn pattern_guess_returns_first_matching_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/joespizza/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/joespizzarestaurant/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<title>Joe's Pizza Restaurant • Boston, MA</title>"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/joespizzaeats/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let profiles = ProfileFetcher::with_base_url(5, "ua", &server.uri()).unwrap();
    let candidate = PatternGuess::new(profiles)
        .search(&joes())
        .await
        .unwrap()
        .candidate()
        .expect("candidate");
    assert_eq!(candidate.handle, "joespizzarestaurant");
    assert!(candidate.evidence.location_matches.contains("boston"));
}

#[tokio::test]
async fn pattern_guess_surfaces_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let profiles = ProfileFetcher::with_base_url(5, "ua", &server.uri()).unwrap();
    let err = PatternGuess::new(profiles).search(&joes()).await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn profile_fetch_reports_status_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ghost/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let profiles = ProfileFetcher::with_base_url(5, "ua", &server.uri()).unwrap();
    let page = profiles.fetch("ghost").await.unwrap();
    assert_eq!(page.status, 404);
    assert!(!page.is_found());
}
