use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use propdesk_client::NoticeLevel;
use propdesk_config::{ApiConfig, SessionConfig};
use propdesk_core::{Location, NavigationKind, Navigator, RoleTag};
use propdesk_session::{
    MemoryStore, RoleSource, Session, SessionError, TokenStorage, tokens::TOKEN_KEY,
};
use serde_json::{Value, json};

#[derive(Default)]
struct Hits {
    user: AtomicUsize,
    logout: AtomicUsize,
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

async fn current_user(State(hits): State<Arc<Hits>>, headers: HeaderMap) -> Response {
    hits.user.fetch_add(1, Ordering::SeqCst);

    match bearer(&headers).as_str() {
        "nested" => axum::Json(json!({
            "data": {"user": {"id": 1, "email": "pm@example.com", "roles": [{"slug": "property-manager"}]}}
        }))
        .into_response(),
        "wrapped" => axum::Json(json!({"user": {"id": 2, "role": "owner"}})).into_response(),
        "bare" => axum::Json(json!({"id": 3, "email": "guest@example.com"})).into_response(),
        "shapeless" => axum::Json(json!({"data": {"id": 4}})).into_response(),
        "expired" => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"message": "Unauthenticated."})),
        )
            .into_response(),
        "hang" => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            axum::Json(json!({"id": 5})).into_response()
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn login(axum::Json(body): axum::Json<Value>) -> Response {
    if body["password"] == "secret" {
        axum::Json(json!({
            "message": "Welcome back",
            "data": {
                "token": "fresh-token",
                "user": {"id": 9, "email": body["email"], "roles": [{"slug": "owner", "name": "Owner"}]}
            }
        }))
        .into_response()
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "message": "The given data was invalid.",
                "errors": {"email": ["These credentials do not match our records."]}
            })),
        )
            .into_response()
    }
}

async fn logout(State(hits): State<Arc<Hits>>, headers: HeaderMap) -> impl IntoResponse {
    assert_eq!(bearer(&headers), "fresh-token");
    hits.logout.fetch_add(1, Ordering::SeqCst);
    axum::Json(json!({"message": "Logged out"}))
}

async fn spawn_backend() -> (String, Arc<Hits>) {
    let hits = Arc::new(Hits::default());
    let api = Router::new()
        .route("/auth/user", get(current_user))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .with_state(Arc::clone(&hits));
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), hits)
}

fn open_tab(base_url: &str, storage: Arc<TokenStorage>, path: &str) -> (Session, Arc<Location>) {
    let location = Arc::new(Location::new(path));
    let api = ApiConfig {
        show_progress: false,
        ..ApiConfig::with_base_url(base_url)
    };
    let session = Session::open(storage, api, SessionConfig::default(), location.clone()).unwrap();
    (session, location)
}

fn storage_with_token(token: &str) -> Arc<TokenStorage> {
    let store = MemoryStore::with_entries([(TOKEN_KEY, token)]);
    Arc::new(TokenStorage::new(store, &SessionConfig::default()))
}

#[tokio::test]
async fn test_construction_hydrates_and_repairs_cookie_drift() {
    let storage = storage_with_token("bare");
    assert_eq!(storage.snapshot().cookie_token, None);

    let (session, _) = open_tab("http://127.0.0.1:9/api", Arc::clone(&storage), "/");

    assert!(session.auth.is_authenticated());
    assert!(!session.auth.is_loading());
    assert!(storage.snapshot().is_consistent());
    assert_eq!(storage.cookie_header(), "auth_token=bare");
}

#[tokio::test]
async fn test_check_auth_without_token_skips_network() {
    let (base, hits) = spawn_backend().await;
    let (session, _) = open_tab(&base, Arc::new(TokenStorage::in_memory()), "/");

    assert!(!session.auth.check_auth().await);
    assert!(!session.auth.is_authenticated());
    assert!(!session.auth.is_loading());
    assert_eq!(hits.user.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_check_auth_accepts_every_envelope() {
    let (base, hits) = spawn_backend().await;

    for (token, id, role) in [
        ("nested", 1, RoleTag::PropertyManager),
        ("wrapped", 2, RoleTag::Owner),
    ] {
        let storage = storage_with_token(token);
        let (session, _) = open_tab(&base, Arc::clone(&storage), "/");

        assert!(session.auth.check_auth().await, "token {token}");
        assert_eq!(session.auth.user().unwrap().id, Some(json!(id)));
        assert_eq!(session.auth.current_role(), Some(role));
        assert_eq!(storage.read_role(), Some(role));
        assert_eq!(storage.read_user(), session.auth.user());
    }

    let (session, _) = open_tab(&base, storage_with_token("bare"), "/guest/dashboard");
    assert!(session.auth.check_auth().await);
    assert_eq!(
        session.auth.user().unwrap().email.as_deref(),
        Some("guest@example.com")
    );
    assert_eq!(
        session.auth.resolve_role(),
        Some((RoleTag::Guest, RoleSource::Path))
    );

    assert_eq!(hits.user.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_check_auth_expired_session_clears_state() {
    let (base, _) = spawn_backend().await;
    let storage = storage_with_token("expired");
    let (session, location) = open_tab(&base, Arc::clone(&storage), "/owner/dashboard");

    assert!(!session.auth.check_auth().await);

    assert!(!session.auth.is_authenticated());
    assert_eq!(session.auth.user(), None);
    assert_eq!(storage.read_token(), None);
    assert!(storage.cookie(TOKEN_KEY).unwrap().is_expired());
    assert_eq!(location.current_path(), "/");
    assert_eq!(location.last().unwrap().kind, NavigationKind::FullReload);
}

#[tokio::test]
async fn test_check_auth_failure_keeps_stale_session() {
    let (base, _) = spawn_backend().await;

    let storage = storage_with_token("broken");
    let (session, location) = open_tab(&base, Arc::clone(&storage), "/owner/dashboard");
    assert!(!session.auth.check_auth().await);
    assert!(session.auth.is_authenticated());
    assert!(session.auth.error().unwrap().contains("500"));
    assert_eq!(storage.read_token().as_deref(), Some("broken"));
    assert!(location.history().is_empty());

    let (session, _) = open_tab(&base, storage_with_token("shapeless"), "/");
    assert!(!session.auth.check_auth().await);
    assert!(session.auth.is_authenticated());
    assert_eq!(
        session.auth.error().as_deref(),
        Some("Invalid user data structure")
    );
}

#[tokio::test(start_paused = true)]
async fn test_check_auth_timeout_keeps_session() {
    let (base, _) = spawn_backend().await;
    let storage = storage_with_token("hang");
    let (session, _) = open_tab(&base, Arc::clone(&storage), "/guest/dashboard");

    let started = tokio::time::Instant::now();
    let verified = session
        .auth
        .check_auth_within(Duration::from_millis(5000))
        .await;

    assert!(!verified);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(session.auth.is_authenticated());
    assert!(!session.auth.is_loading());
    assert_eq!(
        session.auth.error().as_deref(),
        Some("Authentication check timed out after 5000ms")
    );
    assert_eq!(storage.read_token().as_deref(), Some("hang"));
}

#[tokio::test]
async fn test_login_then_logout() {
    let (base, hits) = spawn_backend().await;
    let storage = Arc::new(TokenStorage::in_memory());
    let (session, _) = open_tab(&base, Arc::clone(&storage), "/owner/login");

    let user = session
        .auth
        .login("owner@example.com", "secret", true)
        .await
        .unwrap();

    assert_eq!(user.email.as_deref(), Some("owner@example.com"));
    assert!(session.auth.is_authenticated());
    assert_eq!(session.auth.current_role(), Some(RoleTag::Owner));
    assert_eq!(storage.read_token().as_deref(), Some("fresh-token"));
    assert!(storage.remember_me());
    assert_eq!(
        storage.cookie_header(),
        "auth_token=fresh-token; user_role=owner"
    );
    assert_eq!(
        session.ui.take_notice().map(|n| n.message),
        Some("Welcome back".to_string())
    );

    session.auth.logout().await;

    assert_eq!(hits.logout.load(Ordering::SeqCst), 1);
    assert!(!session.auth.is_authenticated());
    assert_eq!(storage.read_token(), None);
    assert_eq!(storage.read_user(), None);
    assert!(!storage.remember_me());
    assert_eq!(storage.cookie_header(), "");
}

#[tokio::test]
async fn test_login_rejected() {
    let (base, _) = spawn_backend().await;
    let (session, _) = open_tab(&base, Arc::new(TokenStorage::in_memory()), "/guest/login");

    let err = session
        .auth
        .login("guest@example.com", "wrong", false)
        .await
        .unwrap_err();

    match &err {
        SessionError::Api(api) => {
            assert_eq!(api.status(), Some(422));
            assert_eq!(
                api.field_errors("email"),
                ["These credentials do not match our records."]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!session.auth.is_authenticated());
    assert!(!session.auth.is_loading());
    assert_eq!(
        session.auth.error().as_deref(),
        Some("The given data was invalid.")
    );

    let notice = session.ui.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_user_roles_beat_stored_role() {
    let storage = Arc::new(TokenStorage::in_memory());
    let (session, _) = open_tab("http://127.0.0.1:9/api", Arc::clone(&storage), "/guest/dashboard");

    session
        .auth
        .set_authenticated(
            &json!({"user": {"id": 1, "roles": [{"slug": "owner"}]}}),
            Some("t-1"),
            Some(RoleTag::Guest),
        )
        .unwrap();

    assert_eq!(storage.read_role(), Some(RoleTag::Guest));
    assert_eq!(
        session.auth.resolve_role(),
        Some((RoleTag::Owner, RoleSource::UserRoles))
    );
    assert_eq!(session.auth.snapshot().current_role, Some(RoleTag::Owner));
}

#[tokio::test]
async fn test_subscribers_see_state_changes() {
    let storage = Arc::new(TokenStorage::in_memory());
    let (session, _) = open_tab("http://127.0.0.1:9/api", storage, "/");
    let mut rx = session.auth.subscribe();

    session
        .auth
        .set_authenticated(&json!({"id": 1, "role": "guest"}), Some("t"), None)
        .unwrap();
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.current_role, Some(RoleTag::Guest));

    session.auth.clear_auth();
    rx.changed().await.unwrap();
    assert!(!rx.borrow().is_authenticated);
}
