//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → http::cors (OPTIONS → 200, empty)
//!     → hostname.rs (rule for Host? → rule response + access log entry)
//!     → axum Router
//!         admin prefix   → admin (session-guarded)
//!         /health, /     → simulate.rs
//!         anything else  → simulate::fallback
//!                            /{3 digits} in catalogue → simulated status
//!                            under admin prefix       → 401
//!                            otherwise                → 404 envelope
//! ```
//!
//! # Design Decisions
//! - Rules are loaded fresh on every request; there is no rule cache
//! - A failed access log write never changes the response

pub mod hostname;
pub mod simulate;

pub use hostname::apply_hostname_rule;
pub use simulate::{fallback, not_found_response};
