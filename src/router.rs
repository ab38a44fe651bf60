use crate::logging::logging_middleware;
use crate::middleware::edge::edge_guard;
use crate::pages::init_pages_router;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, Uri, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use propdesk_core::AppError;
use serde_json::{Value, json};
use tower_http::set_header::SetResponseHeaderLayer;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(init_pages_router())
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(edge_guard))
        // Guarded pages depend on cookies; never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(middleware::from_fn(logging_middleware))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "app": state.server.app_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::no_page(uri.path())
}
