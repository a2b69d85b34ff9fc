//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (ConnectInfo<SocketAddr>)
//!     → server.rs (Axum setup, tower-http layers)
//!     → cors.rs (CORS headers, OPTIONS short-circuit)
//!     → host.rs (normalized Host for rule lookup)
//!     → dispatch / admin handlers
//!     → status.rs (catalogue codes and reason phrases)
//! ```

pub mod cors;
pub mod host;
pub mod server;
pub mod status;

pub use server::{AppState, HttpServer};
pub use status::HttpStatus;
