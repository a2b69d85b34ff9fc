//! In-memory admin sessions.
//!
//! # Design Decisions
//! - Tokens are 32 bytes from the OS RNG, hex encoded
//! - Expiry is checked lazily on `validate`; there is no sweeper task
//! - Sessions live only in process memory; a restart logs everyone out
//! - The password gate is a single shared secret. The comparison is
//!   constant-time, but a lone static password is only fit for low-value
//!   administrative gating on a trusted network

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

use crate::observability::metrics;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * DEFAULT_SESSION_TTL_SECS;

/// A single authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub authenticated: bool,
}

/// Owner of the session table and the configured admin secret.
#[derive(Debug)]
pub struct SessionGuard {
    sessions: DashMap<String, Session>,
    secret: String,
    ttl: Duration,
}

impl SessionGuard {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            secret: secret.into(),
            ttl: Duration::seconds(ttl_secs.min(MAX_SESSION_TTL_SECS) as i64),
        }
    }

    /// Compare a login candidate with the configured secret.
    pub fn check_password(&self, candidate: &str) -> bool {
        let expected = self.secret.as_bytes();
        let candidate = candidate.as_bytes();
        expected.len() == candidate.len() && bool::from(expected.ct_eq(candidate))
    }

    /// Create an authenticated session and return its token.
    pub fn create_session(&self) -> String {
        self.create_session_at(Utc::now())
    }

    pub fn create_session_at(&self, now: DateTime<Utc>) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.sessions.insert(
            token.clone(),
            Session {
                created_at: now,
                authenticated: true,
            },
        );
        metrics::record_active_sessions(self.sessions.len());
        tracing::info!(active = self.sessions.len(), "Admin session created");
        token
    }

    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    /// Valid when present, authenticated and younger than the TTL.
    /// Expired sessions are removed by the check that finds them.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.sessions.get(token) {
            None => return false,
            Some(session) if now - session.created_at < self.ttl => return session.authenticated,
            Some(_) => {}
        }
        self.sessions.remove(token);
        metrics::record_active_sessions(self.sessions.len());
        tracing::debug!("Admin session expired");
        false
    }

    pub fn destroy(&self, token: &str) {
        if self.sessions.remove(token).is_some() {
            metrics::record_active_sessions(self.sessions.len());
            tracing::info!(active = self.sessions.len(), "Admin session destroyed");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session lifetime in seconds, used for the cookie `Max-Age`.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_check() {
        let guard = SessionGuard::new("s3cret", DEFAULT_SESSION_TTL_SECS);
        assert!(guard.check_password("s3cret"));
        assert!(!guard.check_password("s3cre"));
        assert!(!guard.check_password("S3CRET"));
        assert!(!guard.check_password(""));
    }

    #[test]
    fn test_tokens_are_unique_and_long() {
        let guard = SessionGuard::new("pw", DEFAULT_SESSION_TTL_SECS);
        let a = guard.create_session();
        let b = guard.create_session();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_lazy_expiry() {
        let guard = SessionGuard::new("pw", DEFAULT_SESSION_TTL_SECS);
        let created = Utc::now();
        let token = guard.create_session_at(created);

        assert!(guard.validate_at(&token, created + Duration::hours(23) + Duration::minutes(59)));
        assert_eq!(guard.len(), 1);

        assert!(!guard.validate_at(&token, created + Duration::hours(24) + Duration::minutes(1)));
        assert!(guard.is_empty(), "expired session is removed by the failing check");

        // Gone for good, even when checked at the original time.
        assert!(!guard.validate_at(&token, created));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let guard = SessionGuard::new("pw", 60);
        let created = Utc::now();
        let token = guard.create_session_at(created);
        assert!(!guard.validate_at(&token, created + Duration::seconds(60)));
    }

    #[test]
    fn test_destroy() {
        let guard = SessionGuard::new("pw", DEFAULT_SESSION_TTL_SECS);
        let token = guard.create_session();
        assert!(guard.validate(&token));
        guard.destroy(&token);
        assert!(!guard.validate(&token));
        guard.destroy(&token);
        assert!(!guard.validate("not-a-token"));
    }
}
