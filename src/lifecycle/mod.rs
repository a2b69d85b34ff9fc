//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM / Ctrl+C → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber (HttpServer::run) stops accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel shared by every long-running task
//! - No forced exit deadline; in-flight store writes finish

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
