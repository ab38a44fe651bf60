use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::RawQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use parking_lot::Mutex;
use propdesk_client::{
    ApiClient, ApiError, CancellationToken, FormData, Method, Notice, NoticeLevel, RequestOptions,
    StaticToken, TokenSource, UiFeedback,
};
use propdesk_config::{ApiConfig, ForbiddenPolicy};
use serde_json::{Value, json};

/// Token source that counts how often the backend rejected it.
#[derive(Default)]
struct RecordingTokens {
    token: Mutex<Option<String>>,
    rejections: AtomicUsize,
}

impl RecordingTokens {
    fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            rejections: AtomicUsize::new(0),
        })
    }
}

impl TokenSource for RecordingTokens {
    fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn on_unauthorized(&self) {
        self.token.lock().take();
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Started,
    Progress(u8),
    Finished,
    Notice(Notice),
}

#[derive(Default)]
struct RecordingFeedback {
    events: Mutex<Vec<Event>>,
}

impl UiFeedback for RecordingFeedback {
    fn progress_started(&self) {
        self.events.lock().push(Event::Started);
    }

    fn progress(&self, percent: u8) {
        self.events.lock().push(Event::Progress(percent));
    }

    fn progress_finished(&self) {
        self.events.lock().push(Event::Finished);
    }

    fn notify(&self, notice: Notice) {
        self.events.lock().push(Event::Notice(notice));
    }
}

async fn echo_headers(headers: HeaderMap) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    axum::Json(json!({
        "data": {
            "authorization": header("authorization"),
            "accept": header("accept"),
            "content_type": header("content-type"),
        }
    }))
}

async fn spawn_backend() -> String {
    let api = Router::new()
        .route("/echo", get(echo_headers).post(echo_headers))
        .route("/wrapped", get(|| async { axum::Json(json!({"data": {"id": 1}})) }))
        .route("/bare", get(|| async { axum::Json(json!({"id": 1})) }))
        .route(
            "/saved",
            post(|| async { axum::Json(json!({"message": "Lead saved", "data": {"id": 7}})) }),
        )
        .route("/garbage", get(|| async { "garbage {\"id\":1} trailing" }))
        .route("/plain", get(|| async { "Service Unavailable" }))
        .route(
            "/query",
            get(|RawQuery(query): RawQuery| async move { axum::Json(json!({ "query": query })) }),
        )
        .route(
            "/validate",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    axum::Json(json!({
                        "message": "The given data was invalid.",
                        "errors": {"email": ["The email field is required."]}
                    })),
                )
            }),
        )
        .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/unauthorized",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"message": "Unauthenticated."})),
                )
            }),
        )
        .route(
            "/expired-envelope",
            get(|| async { axum::Json(json!({"statusCode": 401, "message": "Token expired"})) }),
        )
        .route(
            "/forbidden",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    axum::Json(json!({"message": "This action is unauthorized."})),
                )
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(700)).await;
                axum::Json(json!({"data": "late"}))
            }),
        );

    let app = Router::new().nest("/api", api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api")
}

fn client(base_url: &str, tokens: Arc<dyn TokenSource>) -> ApiClient {
    let config = ApiConfig {
        show_progress: false,
        ..ApiConfig::with_base_url(base_url)
    };
    ApiClient::new(config, tokens).unwrap()
}

#[tokio::test]
async fn test_bearer_token_is_sent_verbatim() {
    let base = spawn_backend().await;
    let token = "12|aBcD+/=~opaque.token";
    let api = client(&base, RecordingTokens::with_token(token));

    for options in [
        RequestOptions::get(),
        RequestOptions::with_method(Method::POST).json(json!({"name": "x"})),
    ] {
        let body = api.request("/echo", options).await.unwrap();
        assert_eq!(body["authorization"], json!(format!("Bearer {token}")));
        assert_eq!(body["accept"], json!("application/json"));
        assert_eq!(body["content_type"], json!("application/json"));
    }
}

#[tokio::test]
async fn test_no_token_no_authorization_header() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let body = api.get("/echo").await.unwrap();
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn test_multipart_leaves_content_type_to_transport() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let form = FormData::new()
        .text("title", "Floor plan")
        .file("file", "plan.png", Some("image/png"), vec![0x89, 0x50]);
    let body = api
        .request("/echo", RequestOptions::with_method(Method::POST).multipart(form))
        .await
        .unwrap();

    let content_type = body["content_type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
}

#[tokio::test]
async fn test_data_envelope_is_unwrapped_once() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    assert_eq!(api.get("/wrapped").await.unwrap(), json!({"id": 1}));
    assert_eq!(api.get("/bare").await.unwrap(), json!({"id": 1}));
    assert_eq!(
        api.request("/wrapped", RequestOptions::get().raw())
            .await
            .unwrap(),
        json!({"data": {"id": 1}})
    );
}

#[tokio::test]
async fn test_garbage_around_json_is_recovered() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    assert_eq!(api.get("/garbage").await.unwrap(), json!({"id": 1}));
}

#[tokio::test]
async fn test_success_without_json_is_parse_error() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let err = api.get("/plain").await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
    assert_eq!(
        err.to_string(),
        "Invalid JSON response from server: No valid JSON found in response"
    );
}

#[tokio::test]
async fn test_query_params() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let body = api
        .request(
            "/query",
            RequestOptions::get()
                .param("page", 3)
                .param("status", Value::Null)
                .param("search", "sea view"),
        )
        .await
        .unwrap();

    assert_eq!(body["query"], json!("page=3&search=sea+view"));
}

#[tokio::test]
async fn test_validation_errors() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let err = api.post("/validate", json!({})).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "The given data was invalid.");
    assert_eq!(
        err.field_errors("email"),
        ["The email field is required.".to_string()]
    );
}

#[tokio::test]
async fn test_http_error_without_body() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let err = api.get("/boom").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    assert!(err.validation_errors().is_none());
}

#[tokio::test]
async fn test_unauthorized_drops_token_regardless_of_raw() {
    let base = spawn_backend().await;

    for options in [RequestOptions::get(), RequestOptions::get().raw()] {
        let tokens = RecordingTokens::with_token("stale");
        let api = client(&base, tokens.clone());

        let err = api.request("/unauthorized", options).await.unwrap_err();
        assert!(err.is_auth_expired());
        assert_eq!(tokens.rejections.load(Ordering::SeqCst), 1);
        assert_eq!(tokens.token(), None);
    }
}

#[tokio::test]
async fn test_status_code_401_in_body() {
    let base = spawn_backend().await;
    let tokens = RecordingTokens::with_token("stale");
    let api = client(&base, tokens.clone());

    let err = api.get("/expired-envelope").await.unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(err.status(), Some(401));
    assert_eq!(tokens.rejections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forbidden_policy() {
    let base = spawn_backend().await;

    let tokens = RecordingTokens::with_token("valid");
    let api = client(&base, tokens.clone());
    let err = api.get("/forbidden").await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 403, .. }));
    assert_eq!(tokens.rejections.load(Ordering::SeqCst), 0);

    let tokens = RecordingTokens::with_token("valid");
    let config = ApiConfig {
        forbidden_policy: ForbiddenPolicy::Logout,
        show_progress: false,
        ..ApiConfig::with_base_url(&base)
    };
    let api = ApiClient::new(config, tokens.clone()).unwrap();
    let err = api.get("/forbidden").await.unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(tokens.rejections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let err = api
        .request("/slow", RequestOptions::get().timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Request timeout after 100ms");
}

#[tokio::test]
async fn test_cancellation() {
    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = api
        .request_with_cancel("/slow", RequestOptions::get(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

#[tokio::test]
async fn test_progress_is_simulated_and_capped() {
    let base = spawn_backend().await;
    let feedback = Arc::new(RecordingFeedback::default());
    let api = client(&base, Arc::new(StaticToken(None))).with_feedback(feedback.clone());

    let body = api
        .request("/slow", RequestOptions::get().progress(true).notification(false))
        .await
        .unwrap();
    assert_eq!(body, json!("late"));

    let events = feedback.events.lock().clone();
    assert_eq!(events.first(), Some(&Event::Started));
    assert_eq!(events.last(), Some(&Event::Finished));
    assert_eq!(events[events.len() - 2], Event::Progress(100));

    let in_flight: Vec<u8> = events[1..events.len() - 2]
        .iter()
        .filter_map(|e| match e {
            Event::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(in_flight.len() >= 2);
    assert!(in_flight.iter().all(|p| *p < 90));
    assert!(in_flight.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_progress_disabled_by_default_flag() {
    let base = spawn_backend().await;
    let feedback = Arc::new(RecordingFeedback::default());
    let api = client(&base, Arc::new(StaticToken(None))).with_feedback(feedback.clone());

    api.request("/bare", RequestOptions::get()).await.unwrap();
    assert!(feedback.events.lock().is_empty());
}

#[tokio::test]
async fn test_notifications() {
    let base = spawn_backend().await;
    let feedback = Arc::new(RecordingFeedback::default());
    let api = client(&base, Arc::new(StaticToken(None))).with_feedback(feedback.clone());

    let saved = api.post("/saved", json!({"name": "Lead"})).await.unwrap();
    assert_eq!(saved, json!({"id": 7}));
    let _ = api.post("/validate", json!({})).await;
    let _ = api
        .request(
            "/validate",
            RequestOptions::with_method(Method::POST).notification(false),
        )
        .await;

    let notices: Vec<Notice> = feedback
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            Event::Notice(n) => Some(n.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], Notice::success("Lead saved"));
    assert_eq!(notices[1].level, NoticeLevel::Error);
    assert_eq!(notices[1].message, "The given data was invalid.");
}

#[tokio::test]
async fn test_request_as_typed() {
    #[derive(serde::Deserialize)]
    struct Unit {
        id: u64,
    }

    let base = spawn_backend().await;
    let api = client(&base, Arc::new(StaticToken(None)));

    let unit: Unit = api
        .request_as("/wrapped", RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(unit.id, 1);

    let err = api
        .request_as::<Vec<Unit>>("/wrapped", RequestOptions::get())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::Decode(_)));
}
