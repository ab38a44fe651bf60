//! Page shells for the dashboard route surface.
//!
//! Handlers only render the shell a page is mounted in; the data comes from
//! the REST backend through the API client.

use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use html_escape::encode_text;
use propdesk_core::{AppError, RoleTag};

use crate::state::AppState;

pub fn init_pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/{role}/login", get(login))
        .route("/{role}/signup", get(signup))
        .route("/{role}/forgot-password", get(forgot_password))
        .route("/{role}/dashboard", get(dashboard))
        .route("/{role}/dashboard/{*section}", get(dashboard_section))
        .route("/{role}/{resource}", get(resource_index))
        .route("/{role}/{resource}/new", get(resource_new))
        .route("/{role}/{resource}/{id}", get(resource_show))
        .route("/{role}/{resource}/{id}/edit", get(resource_edit))
}

/// Role slugs in URLs must match exactly.
fn role_segment(raw: &str) -> Result<RoleTag, AppError> {
    RoleTag::ALL
        .into_iter()
        .find(|role| role.as_str() == raw)
        .ok_or_else(|| AppError::unknown_role(raw))
}

/// `title` is escaped here; `body` must already be safe markup.
fn shell(state: &AppState, title: &str, body: String) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><title>{title} | {app}</title></head><body>{body}</body></html>",
        title = encode_text(title),
        app = encode_text(&state.server.app_name)
    ))
}

async fn home(State(state): State<AppState>) -> Html<String> {
    let links: String = RoleTag::ALL
        .iter()
        .map(|role| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                role.login_path(),
                role.display_name()
            )
        })
        .collect();

    shell(&state, "Welcome", format!("<h1>Sign in</h1><ul>{links}</ul>"))
}

async fn login(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Html<String>, AppError> {
    let role = role_segment(&role)?;
    Ok(shell(
        &state,
        "Sign in",
        format!("<h1>{} sign in</h1>", role.display_name()),
    ))
}

async fn signup(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Html<String>, AppError> {
    let role = role_segment(&role)?;
    Ok(shell(
        &state,
        "Sign up",
        format!("<h1>{} sign up</h1>", role.display_name()),
    ))
}

async fn forgot_password(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Html<String>, AppError> {
    let role = role_segment(&role)?;
    Ok(shell(
        &state,
        "Reset password",
        format!(
            "<h1>Reset password</h1><a href=\"{}\">Back to sign in</a>",
            role.login_path()
        ),
    ))
}

async fn dashboard(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Html<String>, AppError> {
    let role = role_segment(&role)?;
    Ok(shell(
        &state,
        "Dashboard",
        format!("<h1>{} dashboard</h1>", role.display_name()),
    ))
}

async fn dashboard_section(
    State(state): State<AppState>,
    Path((role, section)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let role = role_segment(&role)?;
    Ok(shell(
        &state,
        "Dashboard",
        format!(
            "<h1>{} dashboard</h1><h2>{}</h2>",
            role.display_name(),
            encode_text(&section)
        ),
    ))
}

async fn resource_index(
    State(state): State<AppState>,
    Path((role, resource)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    role_segment(&role)?;
    let heading = encode_text(&resource);
    Ok(shell(&state, &resource, format!("<h1>{heading}</h1>")))
}

async fn resource_new(
    State(state): State<AppState>,
    Path((role, resource)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    role_segment(&role)?;
    let heading = encode_text(&resource);
    Ok(shell(&state, &resource, format!("<h1>New {heading}</h1>")))
}

async fn resource_show(
    State(state): State<AppState>,
    Path((role, resource, id)): Path<(String, String, String)>,
) -> Result<Html<String>, AppError> {
    role_segment(&role)?;
    Ok(shell(
        &state,
        &resource,
        format!("<h1>{} #{}</h1>", encode_text(&resource), encode_text(&id)),
    ))
}

async fn resource_edit(
    State(state): State<AppState>,
    Path((role, resource, id)): Path<(String, String, String)>,
) -> Result<Html<String>, AppError> {
    role_segment(&role)?;
    Ok(shell(
        &state,
        &resource,
        format!(
            "<h1>Edit {} #{}</h1>",
            encode_text(&resource),
            encode_text(&id)
        ),
    ))
}
