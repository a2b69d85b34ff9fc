//! Reporting subsystem.
//!
//! # Data Flow
//! ```text
//! access_log::AccessLogStore::load_all
//!     → aggregator.rs (7-day window, ranked top-N)
//!     → WeeklyReport / Analytics
//!
//! Admin "send test report":
//!     → email_config.rs (enabled? recipient? key?)
//!     → mailer.rs (ReportMailer → Resend HTTP API)
//! ```
//!
//! # Design Decisions
//! - Aggregation is pure and takes `now` explicitly
//! - Delivery sits behind a trait so the server can run without a provider

pub mod aggregator;
pub mod email_config;
pub mod mailer;

pub use aggregator::{analytics, weekly_report, Analytics, Summary, WeeklyReport};
pub use email_config::{EmailConfig, EmailConfigStore, EmailConfigUpdate};
pub use mailer::{deliver_weekly_report, ReportMailer, ResendMailer};
