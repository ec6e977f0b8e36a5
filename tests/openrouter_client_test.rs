use jivan::{ClientConfig, CompletionClient, FallbackMessages, OpenRouterClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/api/v1/chat/completions";

fn client_for(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new(ClientConfig::openrouter("or-key").with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_success_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer or-key"))
        .and(header("x-title", "Jivan AI - Spiritual Companion"))
        .and(body_partial_json(json!({
            "model": "mistralai/mistral-7b-instruct",
            "messages": [{"role": "user", "content": "What is seva?"}],
            "max_tokens": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Seva is selfless service."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("What is seva?").await.unwrap();
    assert_eq!(reply, "Seva is selfless service.");
}

#[tokio::test]
async fn test_status_fallbacks_match_gemini_policy() {
    let cases = [
        (429, FallbackMessages::default().busy),
        (503, FallbackMessages::default().unavailable),
        (502, FallbackMessages::default().generic),
    ];
    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let reply = client_for(&server).complete("q").await.unwrap();
        assert_eq!(reply, expected, "status {}", status);
    }
}

#[tokio::test]
async fn test_missing_choices_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[tokio::test]
async fn test_malformed_json_returns_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let reply = client_for(&server).complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}

#[tokio::test]
async fn test_connection_refused_returns_generic_message() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = OpenRouterClient::new(ClientConfig::openrouter("or-key").with_base_url(base)).unwrap();
    let reply = client.complete("q").await.unwrap();
    assert_eq!(reply, FallbackMessages::default().generic);
}
