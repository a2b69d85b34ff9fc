//! The closed catalogue of simulated HTTP status codes.
//!
//! Codes outside this set are never served by the simulator and are rejected
//! when an admin tries to configure them on a hostname rule.

use std::fmt;

use axum::http::StatusCode;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Coarse classification used by the UI and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCategory {
    Success,
    Redirect,
    ClientError,
    ServerError,
}

macro_rules! catalogue {
    ($($variant:ident = $code:literal => $reason:literal,)+) => {
        /// A status code from the known catalogue.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum HttpStatus {
            $($variant,)+
        }

        impl HttpStatus {
            /// Every catalogue entry, in ascending code order.
            pub const ALL: &'static [HttpStatus] = &[$(HttpStatus::$variant,)+];

            /// Look up a numeric code; `None` when it is not in the catalogue.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(HttpStatus::$variant),)+
                    _ => None,
                }
            }

            /// Numeric status code.
            pub fn code(self) -> u16 {
                match self {
                    $(HttpStatus::$variant => $code,)+
                }
            }

            /// Canonical reason phrase.
            pub fn reason(self) -> &'static str {
                match self {
                    $(HttpStatus::$variant => $reason,)+
                }
            }
        }
    };
}

catalogue! {
    Ok = 200 => "OK",
    Created = 201 => "Created",
    NoContent = 204 => "No Content",
    MovedPermanently = 301 => "Moved Permanently",
    Found = 302 => "Found",
    NotModified = 304 => "Not Modified",
    BadRequest = 400 => "Bad Request",
    Unauthorized = 401 => "Unauthorized",
    Forbidden = 403 => "Forbidden",
    NotFound = 404 => "Not Found",
    MethodNotAllowed = 405 => "Method Not Allowed",
    Gone = 410 => "Gone",
    ImATeapot = 418 => "I'm a teapot",
    TooManyRequests = 429 => "Too Many Requests",
    InternalServerError = 500 => "Internal Server Error",
    BadGateway = 502 => "Bad Gateway",
    ServiceUnavailable = 503 => "Service Unavailable",
    GatewayTimeout = 504 => "Gateway Timeout",
}

impl HttpStatus {
    /// Parse a path segment that must be exactly three ASCII digits.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        if segment.len() != 3 || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok().and_then(Self::from_code)
    }

    pub fn category(self) -> StatusCategory {
        match self.code() {
            200..=299 => StatusCategory::Success,
            300..=399 => StatusCategory::Redirect,
            400..=499 => StatusCategory::ClientError,
            _ => StatusCategory::ServerError,
        }
    }

    pub fn is_redirect(self) -> bool {
        self.category() == StatusCategory::Redirect
    }

    /// The `http` crate status for building responses.
    pub fn to_status_code(self) -> StatusCode {
        // Every catalogue code is a valid three-digit status.
        StatusCode::from_u16(self.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl Serialize for HttpStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Accepts either a JSON number or a numeric string (HTML forms send strings).
impl<'de> Deserialize<'de> for HttpStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl de::Visitor<'_> for CodeVisitor {
            type Value = HttpStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a known HTTP status code as a number or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<HttpStatus, E> {
                u16::try_from(v)
                    .ok()
                    .and_then(HttpStatus::from_code)
                    .ok_or_else(|| E::custom(format!("unsupported status code {}", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<HttpStatus, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("unsupported status code {}", v)))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HttpStatus, E> {
                let code: u64 = v
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("invalid status code {:?}", v)))?;
                self.visit_u64(code)
            }
        }

        deserializer.deserialize_any(CodeVisitor)
    }
}
