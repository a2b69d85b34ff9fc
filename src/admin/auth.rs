//! Session cookie handling and the API guard.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::SimError;
use crate::http::server::AppState;

/// Admin session cookie name.
pub const SESSION_COOKIE: &str = "admin-session";

/// `Set-Cookie` value carrying a fresh session token.
pub fn build_session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session token from the `Cookie` header, if any.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|part| part.trim().strip_prefix(prefix.as_str()))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Whether the request carries a live session.
pub fn has_valid_session(state: &AppState, headers: &HeaderMap) -> bool {
    extract_session_cookie(headers)
        .map(|token| state.sessions.validate(&token))
        .unwrap_or(false)
}

/// Middleware for the JSON API: 401 unless the session is valid.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if has_valid_session(&state, request.headers()) {
        next.run(request).await
    } else {
        tracing::debug!(path = %request.uri().path(), "Rejected admin API request without a valid session");
        SimError::Unauthorized.into_response()
    }
}
