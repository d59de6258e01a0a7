//! HTTP-level tests of the Ollama backend against an in-process stub server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mathesis_core::config::LlmSettings;
use mathesis_core::{CoreError, GenerateOptions, Generated, LlmClient, OutputFormat};
use serde_json::{Value, json};
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<Value>>>;

/// Serve `app` on an ephemeral port and return its base URL.
async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn settings(base_url: &str, timeout_seconds: u64) -> LlmSettings {
    LlmSettings {
        base_url: base_url.to_string(),
        model: "stub-model".to_string(),
        timeout_seconds,
        ..LlmSettings::default()
    }
}

/// Echo server: records each request body and answers with a fixed reply.
async fn recording_server(reply: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/api/generate",
            post(move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                Json(json!({"model": "stub-model", "response": reply, "done": true}))
            }),
        )
        .route("/api/tags", get(|| async { Json(json!({"models": []})) }))
        .with_state(seen.clone());
    (spawn(app).await, seen)
}

#[tokio::test]
async fn test_text_mode_round_trip() {
    let (url, seen) = recording_server("x = 2").await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();

    let out = client.generate("solve 2x+3=7", &GenerateOptions::default()).await.unwrap();
    assert_eq!(out, Generated::Text("x = 2".into()));

    let body = &seen.lock().unwrap()[0];
    assert_eq!(body["model"], "stub-model");
    assert_eq!(body["prompt"], "solve 2x+3=7");
    assert_eq!(body["stream"], false);
    assert!(body.get("format").is_none());
    assert!(body.get("images").is_none());
}

#[tokio::test]
async fn test_json_mode_sends_format_and_parses_reply() {
    let (url, seen) = recording_server("```json\n{\"difficulty\": 0.3}\n```").await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();

    let options = GenerateOptions::json()
        .with_temperature(0.2)
        .with_model("other-model")
        .with_image("aGVsbG8=".into());
    let out = client.generate("analyze", &options).await.unwrap();
    assert_eq!(out, Generated::Json(json!({"difficulty": 0.3})));

    let body = &seen.lock().unwrap()[0];
    assert_eq!(body["format"], "json");
    assert_eq!(body["model"], "other-model");
    assert_eq!(body["images"], json!(["aGVsbG8="]));
    let temperature = body["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.2).abs() < 1e-6);
}

#[tokio::test]
async fn test_default_format_comes_from_settings() {
    let (url, _seen) = recording_server("{\"ok\": true}").await;
    let mut s = settings(&url, 5);
    s.default_format = OutputFormat::Json;
    let client = LlmClient::from_settings(&s).unwrap();

    let out = client.generate("p", &GenerateOptions::default()).await.unwrap();
    assert_eq!(out, Generated::Json(json!({"ok": true})));
}

#[tokio::test]
async fn test_json_mode_with_prose_is_malformed() {
    let (url, _seen) = recording_server("Sorry, I cannot help with that.").await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();
    let err = client.generate_json("p", &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    let client = LlmClient::from_settings(&settings("http://127.0.0.1:1", 5)).unwrap();
    let err = client.generate_text("p", &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::BackendUnavailable(_)), "got {err:?}");
    assert!(err.is_retryable());
    assert!(client.ping().await.is_err());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"response": "late"}))
        }),
    );
    let url = spawn(app).await;
    let client = LlmClient::from_settings(&settings(&url, 1)).unwrap();

    let err = client.generate_text("p", &GenerateOptions::default()).await.unwrap_err();
    assert_eq!(err, CoreError::Timeout { seconds: 1 });
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let app = Router::new().route(
        "/api/generate",
        post(|| async {
            (StatusCode::NOT_FOUND, Json(json!({"error": "model 'stub-model' not found"})))
                .into_response()
        }),
    );
    let url = spawn(app).await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();

    match client.generate_text("p", &GenerateOptions::default()).await.unwrap_err() {
        CoreError::BackendUnavailable(msg) => {
            assert!(msg.contains("404"));
            assert!(msg.contains("model 'stub-model' not found"));
        }
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_envelope_is_malformed() {
    let app = Router::new().route("/api/generate", post(|| async { Json(json!({"choices": []})) }));
    let url = spawn(app).await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();
    let err = client.generate_text("p", &GenerateOptions::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_ping_reaches_stub() {
    let (url, _seen) = recording_server("").await;
    let client = LlmClient::from_settings(&settings(&url, 5)).unwrap();
    client.ping().await.unwrap();
}
