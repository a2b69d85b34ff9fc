//! hostsim: an HTTP response simulator with per-hostname overrides.

pub mod access_log;
pub mod admin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod report;
pub mod rules;

pub use config::schema::SimConfig;
pub use error::{SimError, SimResult};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
