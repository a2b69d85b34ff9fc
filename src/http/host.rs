//! Hostname extraction for rule lookups.
//!
//! # Design Decisions
//! - Host matching is case-insensitive
//! - The port suffix is stripped, IPv6 literals keep their brackets
//! - A missing or non-UTF-8 Host header yields an empty hostname

use axum::http::{header, HeaderMap};

/// Normalize a raw `Host` value: lowercase, without a trailing `:port`.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = match raw.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && !name.is_empty()
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => raw,
    };
    host.to_ascii_lowercase()
}

/// The normalized hostname a request was addressed to.
pub fn request_host(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(normalize_host)
        .unwrap_or_default()
}
