//! Access log subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch::hostname (rule hit)
//!     → entry.rs (AccessLogEntry)
//!     → store.rs (serialized append, rotation past the ceiling)
//!     → access-logs.json  +  access-logs-archive-YYYY-MM-DD[-N].json
//!
//! Readers:
//!     → report::aggregator (weekly report, analytics)
//!     → export.rs (admin JSON/CSV download)
//! ```
//!
//! # Design Decisions
//! - Whole-document rewrite per append; the rotation ceiling bounds its cost
//! - Every entry ends up either live or archived
//! - `clear` only touches the live log

pub mod entry;
pub mod export;
pub mod store;

pub use entry::{AccessLogEntry, RuleKind};
pub use store::AccessLogStore;
