use nse_api::types::{SessionCookie, SessionCredentials};
use nse_api::{Client, Error};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn credentials() -> SessionCredentials {
    SessionCredentials::new(
        vec![
            SessionCookie::new("nsit", "abc123"),
            SessionCookie::new("nseappid", "token"),
        ],
        "Mozilla/5.0 test-agent",
    )
}

#[tokio::test]
async fn search_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("search.json");

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .and(query_param("q", "Acme Ltd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let resp = client.search("Acme Ltd", &credentials()).await.unwrap();
    assert_eq!(resp.results.len(), 2);
    assert_eq!(resp.results[1].symbol_info, "Acme Ltd");
}

#[tokio::test]
async fn search_replays_cookies_and_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .and(header("cookie", "nsit=abc123; nseappid=token"))
        .and(header("user-agent", "Mozilla/5.0 test-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":[]}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let resp = client.search("Anything", &credentials()).await.unwrap();
    assert!(resp.results.is_empty());
}

#[tokio::test]
async fn find_symbol_exact_match_only() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("search.json");

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let symbol = client.find_symbol("Acme Ltd", &credentials()).await.unwrap();
    assert_eq!(symbol.as_deref(), Some("ACME"));

    let symbol = client.find_symbol("ACME HOLDINGS", &credentials()).await.unwrap();
    assert_eq!(symbol.as_deref(), Some("ACMEHOLD"));

    let symbol = client.find_symbol("Acme", &credentials()).await.unwrap();
    assert_eq!(symbol, None);
}

#[tokio::test]
async fn find_symbol_missing_results_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let result = client.find_symbol("Acme Ltd", &credentials()).await;
    assert!(matches!(result, Err(Error::MalformedBody(_))));
}

#[tokio::test]
async fn find_symbol_empty_results_is_no_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":[]}"#))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let symbol = client.find_symbol("Acme Ltd", &credentials()).await.unwrap();
    assert_eq!(symbol, None);
}

#[tokio::test]
async fn search_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Resource not found"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let result = client.search("Acme Ltd", &credentials()).await;
    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Resource not found");
        }
        other => panic!("expected HttpStatus, got {:?}", other.map(|r| r.results.len())),
    }
}

#[tokio::test]
async fn search_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/autocomplete"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access Denied</html>"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri());
    let result = client.find_symbol("Acme Ltd", &credentials()).await;
    assert!(matches!(result, Err(Error::MalformedBody(_))));
}
