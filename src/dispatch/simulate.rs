//! Generic status-code simulation and the fixed public endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::SimError;
use crate::http::server::AppState;
use crate::http::status::HttpStatus;
use crate::observability::metrics;

pub const POWERED_BY: &str = "hostsim";

pub(crate) const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
const X_HTTP_METHOD: HeaderName = HeaderName::from_static("x-http-method");
const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");
const X_CUSTOM_HEADER: HeaderName = HeaderName::from_static("x-custom-header");
const X_CUSTOM_RESPONSE: HeaderName = HeaderName::from_static("x-custom-response");

/// Current time as RFC 3339 with millisecond precision.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct NotFoundBody {
    code: u16,
    message: &'static str,
    error: &'static str,
    timestamp: String,
}

/// Fixed 404 envelope for unknown paths and unsupported codes.
pub fn not_found_response() -> Response {
    let body = NotFoundBody {
        code: 404,
        message: "Not Found",
        error: "Unsupported HTTP code or invalid path",
        timestamp: timestamp(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceivedHeaders<'a> {
    received: usize,
    user_agent: &'a str,
    custom_header: Option<&'a str>,
}

#[derive(Serialize)]
struct SimulatedBody<'a> {
    code: u16,
    message: &'static str,
    method: &'a str,
    timestamp: String,
    headers: ReceivedHeaders<'a>,
}

/// Respond with `status` the way `GET /{code}` does.
pub fn simulate(status: HttpStatus, method: &Method, headers: &HeaderMap) -> Response {
    let custom = headers.get(X_CUSTOM_HEADER).and_then(|v| v.to_str().ok());
    let now = timestamp();

    let mut response = if method == Method::HEAD {
        StatusCode::OK.into_response()
    } else {
        let body = SimulatedBody {
            code: status.code(),
            message: status.reason(),
            method: method.as_str(),
            timestamp: now.clone(),
            headers: ReceivedHeaders {
                received: headers.keys_len(),
                user_agent: headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("Unknown"),
                custom_header: custom,
            },
        };
        Json(body).into_response()
    };
    *response.status_mut() = status.to_status_code();

    let cache = if method == Method::GET || method == Method::HEAD {
        "public, max-age=3600"
    } else {
        "no-cache"
    };

    let out = response.headers_mut();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    out.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache));
    out.insert(X_POWERED_BY, HeaderValue::from_static(POWERED_BY));
    if let Ok(v) = HeaderValue::from_str(method.as_str()) {
        out.insert(X_HTTP_METHOD, v);
    }
    if let Ok(v) = HeaderValue::from_str(&now) {
        out.insert(X_RESPONSE_TIME, v);
    }
    if let Some(custom) = custom {
        if let Ok(v) = HeaderValue::from_str(&format!("Custom header received: {}", custom)) {
            out.insert(X_CUSTOM_RESPONSE, v);
        }
    }

    metrics::record_request("simulate", status.code());
    response
}

/// Router fallback: admin-prefixed leftovers, `/{code}` simulation, then 404.
pub async fn fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path();
    if path.starts_with(state.admin_prefix()) {
        return SimError::Unauthorized.into_response();
    }

    let segment = path.strip_prefix('/').unwrap_or(path);
    if let Some(status) = HttpStatus::from_path_segment(segment) {
        return simulate(status, &method, &headers);
    }

    metrics::record_request("not_found", 404);
    match segment.parse::<u16>() {
        Ok(code) if segment.len() == 3 => {
            tracing::debug!(code, "Status code outside the catalogue");
            SimError::UnsupportedCode(code).into_response()
        }
        _ => {
            tracing::debug!(path = %path, "No handler for path");
            not_found_response()
        }
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    uptime: f64,
    timestamp: String,
    version: &'static str,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp: timestamp(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /`
pub async fn home() -> Html<String> {
    let mut rows = String::new();
    for status in HttpStatus::ALL {
        rows.push_str(&format!(
            "<li><a href=\"/{code}\"><code>{code}</code></a> {reason}</li>\n",
            code = status.code(),
            reason = status.reason(),
        ));
    }

    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>hostsim</title></head>\n\
         <body>\n<h1>hostsim</h1>\n\
         <p>Request <code>/{{code}}</code> with any method to receive that status. \
         <code>HEAD</code> returns headers only; send <code>X-Custom-Header</code> to have it echoed.</p>\n\
         <ul>\n{rows}</ul>\n<p><a href=\"/health\">/health</a></p>\n</body>\n</html>\n"
    ))
}
