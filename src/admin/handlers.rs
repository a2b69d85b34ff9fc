//! Admin page and JSON API handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::access_log::export::{render, ExportFormat};
use crate::admin::auth::{
    build_session_cookie, clear_session_cookie, extract_session_cookie, has_valid_session,
};
use crate::admin::pages;
use crate::error::{SimError, SimResult};
use crate::http::host::normalize_host;
use crate::http::server::AppState;
use crate::report::{analytics, deliver_weekly_report, weekly_report, EmailConfigUpdate};
use crate::rules::{RuleInput, RuleSet};

const INVALID_JSON: &str = "Invalid JSON data";

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Any admin path or method without a dedicated handler.
pub async fn unauthorized() -> SimError {
    SimError::Unauthorized
}

/// `GET {prefix}` : dashboard with a session, login form without.
pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let prefix = state.admin_prefix();
    if has_valid_session(&state, &headers) {
        let rules = state.rules.load().await;
        Html(pages::dashboard_page(prefix, &rules))
    } else {
        Html(pages::login_page(prefix, None))
    }
}

/// `GET {prefix}/stats`
pub async fn stats_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if has_valid_session(&state, &headers) {
        Html(pages::stats_page(state.admin_prefix())).into_response()
    } else {
        found(state.admin_prefix())
    }
}

/// `GET {prefix}/email`
pub async fn email_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if has_valid_session(&state, &headers) {
        Html(pages::email_page(state.admin_prefix())).into_response()
    } else {
        found(state.admin_prefix())
    }
}

/// `POST {prefix}/login` with a urlencoded `password` field.
pub async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let password = url::form_urlencoded::parse(&body)
        .find(|(key, _)| key == "password")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    if !state.sessions.check_password(&password) {
        tracing::warn!("Admin login rejected");
        return Html(pages::login_page(state.admin_prefix(), Some("Invalid password"))).into_response();
    }

    let token = state.sessions.create_session();
    let cookie = build_session_cookie(&token, state.sessions.ttl_secs(), state.config.admin.secure_cookie);
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, state.admin_prefix().to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

/// `{prefix}/logout`, any method.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_cookie(&headers) {
        state.sessions.destroy(&token);
    }
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(state.config.admin.secure_cookie)),
        ],
    )
        .into_response()
}

/// `GET {prefix}/api/rules`
pub async fn list_rules(State(state): State<AppState>) -> Json<RuleSet> {
    Json(state.rules.load().await)
}

/// `POST {prefix}/api/rules`
pub async fn add_rule(State(state): State<AppState>, body: Bytes) -> SimResult<&'static str> {
    let input: RuleInput =
        serde_json::from_slice(&body).map_err(|_| SimError::Validation(INVALID_JSON.into()))?;
    let (hostname, rule) = input.into_rule()?;

    tracing::info!(hostname = %hostname, rule_type = rule.type_name(), status = rule.code().code(), "Saving hostname rule");
    state.rules.upsert(hostname, rule).await?;
    Ok("Rule added successfully")
}

/// `DELETE {prefix}/api/rules/{hostname}`
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
) -> SimResult<&'static str> {
    let hostname = normalize_host(&hostname);
    state.rules.remove(&hostname).await?;
    tracing::info!(hostname = %hostname, "Deleted hostname rule");
    Ok("Rule deleted successfully")
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// `GET {prefix}/api/logs/export?format=json|csv`
pub async fn export_logs(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> SimResult<Response> {
    let format = ExportFormat::from_query(query.format.as_deref());
    let entries = state.logs.load_all().await;
    let body = render(&entries, format)?;
    let disposition = format!(
        "attachment; filename=hostsim-logs-{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `DELETE {prefix}/api/logs/clear`
pub async fn clear_logs(State(state): State<AppState>) -> SimResult<&'static str> {
    state.logs.clear().await?;
    tracing::info!("Access log cleared");
    Ok("Logs cleared successfully")
}

/// `GET {prefix}/api/stats`
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.logs.load_all().await;
    Json(analytics(&entries))
}

/// `GET {prefix}/api/report`
pub async fn report(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.logs.load_all().await;
    Json(json!({ "report": weekly_report(&entries, Utc::now()) }))
}

/// `GET {prefix}/api/email`, API key masked.
pub async fn get_email_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.email.load().await.masked())
}

/// `POST {prefix}/api/email`
pub async fn save_email_config(
    State(state): State<AppState>,
    body: Bytes,
) -> SimResult<&'static str> {
    let update: EmailConfigUpdate =
        serde_json::from_slice(&body).map_err(|_| SimError::Validation(INVALID_JSON.into()))?;
    let config = state.email.update(update).await?;
    tracing::info!(enabled = config.enabled, "Email configuration saved");
    Ok("Email configuration saved successfully")
}

/// `POST {prefix}/api/email/test`: send this week's report now.
pub async fn send_test_report(State(state): State<AppState>) -> SimResult<&'static str> {
    deliver_weekly_report(state.mailer.as_ref(), &state.email, &state.logs, Utc::now()).await?;
    Ok("Test email sent successfully")
}
