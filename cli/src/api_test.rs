use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;

use super::*;

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy { attempts, delay: Duration::from_millis(1) }
}

// =============================================================================
// RetryPolicy
// =============================================================================

#[test]
fn default_policy_is_two_attempts() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.attempts, DEFAULT_CHAT_ATTEMPTS);
    assert_eq!(policy.delay, Duration::from_millis(DEFAULT_CHAT_RETRY_DELAY_MS));
}

#[test]
fn retryable_classification() {
    assert!(CliError::ServerError { status: 503, message: String::new() }.is_retryable());
    assert!(CliError::MissingField("response").is_retryable());
    assert!(CliError::InvalidJson(serde_json::from_str::<Value>("<html>").unwrap_err()).is_retryable());
    assert!(!CliError::ServerError { status: 400, message: String::new() }.is_retryable());
    assert!(!CliError::MissingUserId.is_retryable());
}

#[tokio::test]
async fn retry_recovers_on_second_attempt() {
    let calls = AtomicU32::new(0);
    let result = fast_policy(2)
        .run(|attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    Err(CliError::ServerError { status: 502, message: "bad gateway".into() })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retry_gives_up_after_attempts() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = fast_policy(3)
        .run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CliError::MissingField("response")) }
        })
        .await;
    assert!(matches!(result, Err(CliError::MissingField("response"))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = fast_policy(5)
        .run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CliError::ServerError { status: 400, message: "bad input".into() }) }
        })
        .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_attempts_still_tries_once() {
    let calls = AtomicU32::new(0);
    let _ = fast_policy(0)
        .run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CliError>(()) }
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// HubClient against a local server
// =============================================================================

#[test]
fn chat_url_defaults_under_base_url() {
    let client = HubClient::new("http://127.0.0.1:3000/", None, RetryPolicy::default()).unwrap();
    assert_eq!(client.chat_url(), "http://127.0.0.1:3000/chat-with-ai");

    let client =
        HubClient::new("http://127.0.0.1:3000", Some("https://edge.example/chat"), RetryPolicy::default()).unwrap();
    assert_eq!(client.chat_url(), "https://edge.example/chat");
}

#[test]
fn non_http_urls_are_rejected() {
    assert!(matches!(
        HubClient::new("localhost:3000", None, RetryPolicy::default()),
        Err(CliError::InvalidBaseUrl(_))
    ));
    assert!(HubClient::new("http://ok", Some("ftp://nope"), RetryPolicy::default()).is_err());
}

#[derive(Clone)]
struct Flaky {
    calls: Arc<AtomicU32>,
    fail_first: u32,
    fail_status: StatusCode,
}

async fn flaky_chat(State(flaky): State<Flaky>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = flaky.calls.fetch_add(1, Ordering::SeqCst);
    if n < flaky.fail_first {
        return (flaky.fail_status, Json(serde_json::json!({ "error": "try later" })));
    }
    let message = body["message"].as_str().unwrap_or_default();
    (StatusCode::OK, Json(serde_json::json!({ "response": format!("re: {message}") })))
}

async fn spawn_chat_server(fail_first: u32, fail_status: StatusCode) -> (String, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let app = Router::new()
        .route("/chat-with-ai", post(flaky_chat))
        .with_state(Flaky { calls: calls.clone(), fail_first, fail_status });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), calls)
}

#[tokio::test]
async fn chat_retries_server_errors_then_succeeds() {
    let (base, calls) = spawn_chat_server(1, StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = HubClient::new(&base, None, fast_policy(2)).unwrap();

    let reply = client.chat(Uuid::new_v4(), "hello").await.unwrap();
    assert_eq!(reply, "re: hello");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn chat_surfaces_error_after_last_attempt() {
    let (base, calls) = spawn_chat_server(10, StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = HubClient::new(&base, None, fast_policy(2)).unwrap();

    let err = client.chat(Uuid::new_v4(), "hello").await.unwrap_err();
    assert!(matches!(err, CliError::ServerError { status: 500, ref message } if message == "try later"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn chat_bad_request_is_not_retried() {
    let (base, calls) = spawn_chat_server(10, StatusCode::BAD_REQUEST).await;
    let client = HubClient::new(&base, None, fast_policy(3)).unwrap();

    assert!(client.chat(Uuid::new_v4(), "hello").await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

async fn spawn_plain_text_server() -> String {
    let app = Router::new()
        .route("/generate-image", post(|| async { (StatusCode::OK, "<html>ok</html>") }))
        .route("/api/images", axum::routing::get(|| async { (StatusCode::BAD_GATEWAY, "upstream down\n") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn non_json_success_body_is_an_error() {
    let base = spawn_plain_text_server().await;
    let client = HubClient::new(&base, None, fast_policy(1)).unwrap();

    let err = client.generate_image(Uuid::new_v4(), "a cat").await.unwrap_err();
    assert!(matches!(err, CliError::InvalidJson(_)));
}

#[tokio::test]
async fn plain_text_error_body_becomes_message() {
    let base = spawn_plain_text_server().await;
    let client = HubClient::new(&base, None, fast_policy(1)).unwrap();

    let err = client.list_images(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CliError::ServerError { status: 502, ref message } if message == "upstream down"));
}
