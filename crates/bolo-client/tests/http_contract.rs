//! Contract tests for `HttpChatService` against a mocked answering service.
//!
//! Each test stands up its own `wiremock` server and checks the request
//! shape sent to one endpoint and how its response (or failure) is decoded.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bolo_client::{ChatRequest, ChatService, HttpChatService, TtsRequest};
use bolo_core::error::BoloError;
use bolo_core::types::Turn;

// =============================================================================
// Helpers
// =============================================================================

async fn service_for(server: &MockServer) -> HttpChatService {
    HttpChatService::new(&server.uri(), None).unwrap()
}

fn chat_request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        language: "en".to_string(),
        session_id: Some("s1".to_string()),
    }
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "user_id": "alice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user_id": "alice",
            "session_id": "s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = service_for(&server).await.login("alice").await.unwrap();
    assert_eq!(identity.user_id, "alice");
    assert_eq!(identity.session_id, "s1");
}

#[tokio::test]
async fn test_login_not_found_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "User not found" })),
        )
        .mount(&server)
        .await;

    let err = service_for(&server).await.login("ghost").await.unwrap_err();
    match err {
        BoloError::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "User not found");
        }
        other => panic!("Expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_missing_session_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_id": "alice" })))
        .mount(&server)
        .await;

    let err = service_for(&server).await.login("alice").await.unwrap_err();
    assert!(matches!(err, BoloError::InvalidResponse(_)));
}

// =============================================================================
// History and languages
// =============================================================================

#[tokio::test]
async fn test_user_history_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user_history/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "histories": [{
                "session_id": "s0",
                "history": [
                    { "role": "user", "message": "literacy in Kerala?", "created_at": "2024-01-01" },
                    { "role": "bot", "message": "94%", "created_at": "2024-01-01" }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let records = service_for(&server).await.user_history("alice").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, "s0");
    assert_eq!(
        records[0].turns(),
        vec![Turn::user("literacy in Kerala?"), Turn::bot("94%")]
    );
}

#[tokio::test]
async fn test_user_history_missing_field_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user_history/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let records = service_for(&server).await.user_history("alice").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_languages_decodes_options() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "languages": [
                { "code": "en", "name": "English" },
                { "code": "kn", "name": "Kannada" }
            ]
        })))
        .mount(&server)
        .await;

    let languages = service_for(&server).await.languages().await.unwrap();
    assert_eq!(languages.len(), 2);
    assert_eq!(languages[1].code, "kn");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_sends_message_language_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({
            "message": "population of Delhi?",
            "language": "en",
            "session_id": "s1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "21.75 million",
            "session_id": "s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = service_for(&server)
        .await
        .chat(&chat_request("population of Delhi?"))
        .await
        .unwrap();
    assert_eq!(answer, "21.75 million");
}

#[tokio::test]
async fn test_chat_empty_response_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  " })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .await
        .chat(&chat_request("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, BoloError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_chat_malformed_body_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .await
        .chat(&chat_request("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, BoloError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_chat_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .await
        .chat(&chat_request("hello"))
        .await
        .unwrap_err();
    assert!(err.is_service_failure());
    assert!(matches!(err, BoloError::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_chat_connection_refused_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let svc = HttpChatService::new(&format!("http://127.0.0.1:{}", port), None).unwrap();
    let err = svc.chat(&chat_request("hello")).await.unwrap_err();
    assert!(matches!(err, BoloError::Network(_)));
}

// =============================================================================
// Synthesis, recognition, health
// =============================================================================

#[tokio::test]
async fn test_synthesize_returns_audio_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(body_json(json!({ "text": "21.75 million", "language": "hi" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "audio_url": "/static/tts_1.mp3" })),
        )
        .mount(&server)
        .await;

    let audio = service_for(&server)
        .await
        .synthesize(&TtsRequest {
            text: "21.75 million".to_string(),
            language: "hi".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(audio.as_deref(), Some("/static/tts_1.mp3"));
}

#[tokio::test]
async fn test_synthesize_null_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_url": null,
            "error": "gTTS failed"
        })))
        .mount(&server)
        .await;

    let audio = service_for(&server)
        .await
        .synthesize(&TtsRequest {
            text: "x".to_string(),
            language: "en".to_string(),
        })
        .await
        .unwrap();
    assert!(audio.is_none());
}

#[tokio::test]
async fn test_transcribe_posts_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stt"))
        .and(body_json(json!({ "audio_data": "AAAA", "language": "ta" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "vanakkam" })))
        .mount(&server)
        .await;

    let text = service_for(&server)
        .await
        .transcribe("AAAA", "ta")
        .await
        .unwrap();
    assert_eq!(text, "vanakkam");
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "time": "2024-05-01T00:00:00",
            "census_enabled": true,
            "translation_enabled": true
        })))
        .mount(&server)
        .await;

    let health = service_for(&server).await.health().await.unwrap();
    assert!(health.is_ok());
    assert!(health.census_enabled);
}
