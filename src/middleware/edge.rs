//! Edge route guard.
//!
//! Runs before any page handler. The session is whatever the `auth_token`
//! and `user_role` cookies say; the decision comes from the shared route
//! policy and redirects use `307 Temporary Redirect`.

use std::borrow::Cow;

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::headers::{Cookie, HeaderMapExt};
use propdesk_core::{RoleTag, RouteClass, SessionView, classify, decide};
use propdesk_session::tokens::{ROLE_KEY, TOKEN_KEY};
use tracing::debug;
use urlencoding::decode;

/// Reads the session view from the request cookies. A missing or empty
/// token means anonymous; an unknown role tag reads as no role.
pub fn session_from_cookies(headers: &HeaderMap) -> SessionView {
    let Some(cookies) = headers.typed_get::<Cookie>() else {
        return SessionView::anonymous();
    };

    let has_token = cookies
        .get(TOKEN_KEY)
        .is_some_and(|token| !cookie_value(token).is_empty());
    if !has_token {
        return SessionView::anonymous();
    }

    let role = cookies
        .get(ROLE_KEY)
        .and_then(|role| RoleTag::parse(&cookie_value(role)));
    SessionView::authenticated(role)
}

/// Percent-decodes a cookie value; values that do not decode are used as sent.
fn cookie_value(raw: &str) -> Cow<'_, str> {
    decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Middleware for `axum::middleware::from_fn`.
///
/// ```ignore
/// let app = Router::new()
///     .merge(init_pages_router())
///     .layer(middleware::from_fn(edge_guard));
/// ```
pub async fn edge_guard(req: Request, next: Next) -> Response {
    let route = classify(req.uri().path());
    if route == RouteClass::Bypass {
        return next.run(req).await;
    }

    let session = session_from_cookies(req.headers());
    let decision = decide(&session, &route);

    match decision.target() {
        Some(target) => {
            debug!(
                path = %req.uri().path(),
                target = %target,
                ?route,
                authenticated = session.authenticated,
                "Edge guard redirect"
            );
            Redirect::temporary(&target).into_response()
        }
        None => next.run(req).await,
    }
}
