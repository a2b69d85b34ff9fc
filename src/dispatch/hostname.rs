//! Per-hostname rule application.
//!
//! Runs ahead of routing so that a rule overrides every non-admin path on
//! its hostname, including `/`, `/health` and the simulation paths.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::access_log::{AccessLogEntry, RuleKind};
use crate::dispatch::simulate::{timestamp, POWERED_BY, X_POWERED_BY};
use crate::http::host::request_host;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rules::Rule;

#[derive(Serialize)]
struct RedirectBody<'a> {
    code: u16,
    message: &'static str,
    target: &'a str,
    hostname: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverrideBody<'a> {
    code: u16,
    message: &'static str,
    hostname: &'a str,
    rule_type: &'static str,
    timestamp: String,
}

/// Best-effort client address for the access log.
fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Build the response a rule dictates for `hostname`.
pub fn rule_response(rule: &Rule, hostname: &str) -> Response {
    let code = rule.code();
    match rule {
        Rule::Redirect { target, .. } => {
            let body = RedirectBody {
                code: code.code(),
                message: code.reason(),
                target,
                hostname,
                timestamp: timestamp(),
            };
            let mut response = (code.to_status_code(), Json(body)).into_response();
            match HeaderValue::from_str(target) {
                Ok(location) => {
                    response.headers_mut().insert(header::LOCATION, location);
                }
                Err(_) => {
                    tracing::error!(hostname = %hostname, target = %target, "Redirect target is not a valid header value");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
            response
        }
        Rule::Status { .. } => {
            let body = OverrideBody {
                code: code.code(),
                message: code.reason(),
                hostname,
                rule_type: RuleKind::HostnameOverride.as_str(),
                timestamp: timestamp(),
            };
            let mut response = (code.to_status_code(), Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(X_POWERED_BY, HeaderValue::from_static(POWERED_BY));
            headers.insert("x-hostname-rule", HeaderValue::from_static("true"));
            response
        }
    }
}

/// Middleware: answer from the hostname's rule when one exists.
pub async fn apply_hostname_rule(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with(state.admin_prefix()) {
        return next.run(request).await;
    }

    let hostname = request_host(request.headers());
    if hostname.is_empty() {
        return next.run(request).await;
    }

    let Some(rule) = state.rules.get(&hostname).await else {
        return next.run(request).await;
    };

    let kind = match rule {
        Rule::Status { .. } => RuleKind::Status,
        Rule::Redirect { .. } => RuleKind::Redirect,
    };
    let code = rule.code().code();

    tracing::debug!(hostname = %hostname, path = %path, rule_type = kind.as_str(), status = code, "Applying hostname rule");

    let entry = AccessLogEntry::now(
        hostname.as_str(),
        path,
        request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        client_ip(&request),
        code,
        kind,
        rule.target().map(str::to_string),
    );
    if let Err(e) = state.logs.append(entry).await {
        tracing::error!(hostname = %hostname, error = %e, "Failed to record access log entry");
    }

    metrics::record_rule_hit(kind.as_str());
    metrics::record_request("rule", code);
    rule_response(&rule, &hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::status::HttpStatus;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_redirect_response() {
        let rule = Rule::Redirect {
            code: HttpStatus::MovedPermanently,
            target: "https://example.org/".to_string(),
        };
        let response = rule_response(&rule, "old.example");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://example.org/");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["target"], "https://example.org/");
        assert_eq!(body["hostname"], "old.example");
        assert_eq!(body["message"], "Moved Permanently");
    }

    #[tokio::test]
    async fn test_status_override_response() {
        let rule = Rule::Status { code: HttpStatus::ServiceUnavailable };
        let response = rule_response(&rule, "down.example");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["x-hostname-rule"], "true");
        assert_eq!(response.headers()[X_POWERED_BY], POWERED_BY);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ruleType"], "hostname-override");
        assert_eq!(body["code"], 503);
    }
}
