//! Hostname override rules.
//!
//! # Data Flow
//! ```text
//! Admin API (POST/DELETE rules)
//!     → types.rs (RuleInput → validated Rule)
//!     → store.rs (serialized read-modify-write, atomic rename)
//!     → domain-rules.json
//!
//! Every inbound request:
//!     → store.rs (fresh load, no cache)
//!     → dispatch::hostname (apply rule or fall through)
//! ```

pub mod store;
pub mod types;

pub use store::{RuleSet, RuleStore};
pub use types::{Rule, RuleInput};
