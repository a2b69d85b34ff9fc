//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Own the shared stores and session guard (`AppState`)
//! - Create the Axum Router with public, simulation and admin handlers
//! - Wire up middleware (hostname rules, CORS, limits, timeouts, request ID, tracing)
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{http::HeaderName, middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access_log::AccessLogStore;
use crate::admin::{admin_router, SessionGuard};
use crate::config::SimConfig;
use crate::dispatch::{apply_hostname_rule, fallback, simulate};
use crate::http::cors;
use crate::report::{EmailConfigStore, ReportMailer, ResendMailer};
use crate::rules::RuleStore;

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SimConfig>,
    pub rules: Arc<RuleStore>,
    pub logs: Arc<AccessLogStore>,
    pub sessions: Arc<SessionGuard>,
    pub email: Arc<EmailConfigStore>,
    pub mailer: Arc<dyn ReportMailer>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from config with the given report mailer.
    pub fn new(config: SimConfig, mailer: Arc<dyn ReportMailer>) -> Self {
        let storage = &config.storage;
        let rules = Arc::new(RuleStore::new(storage.rules_path()));
        let logs = Arc::new(AccessLogStore::with_limits(
            storage.access_log_path(),
            config.access_log.max_entries,
            config.access_log.retain_entries,
        ));
        let email = Arc::new(EmailConfigStore::new(storage.email_config_path()));
        let sessions = Arc::new(SessionGuard::new(
            config.admin.password.clone(),
            config.admin.session_ttl_secs,
        ));

        Self {
            config: Arc::new(config),
            rules,
            logs,
            sessions,
            email,
            mailer,
            started_at: Instant::now(),
        }
    }

    pub fn admin_prefix(&self) -> &str {
        &self.config.admin.path_prefix
    }
}

/// HTTP server for the simulator.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server that delivers reports through Resend.
    pub fn new(config: SimConfig) -> Self {
        Self::with_state(AppState::new(config, Arc::new(ResendMailer::new())))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: request ID, tracing, timeout, body limit,
    /// CORS headers, preflight, hostname rules, then routing.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = Arc::clone(&state.config);
        let [allow_origin, allow_methods, allow_headers] = cors::header_layers();

        Router::new()
            .route("/", any(simulate::home))
            .route("/health", any(simulate::health))
            .merge(admin_router(&config.admin.path_prefix, &state))
            .fallback(fallback)
            .layer(middleware::from_fn_with_state(state.clone(), apply_hostname_rule))
            .with_state(state)
            .layer(middleware::from_fn(cors::preflight))
            .layer(allow_origin)
            .layer(allow_methods)
            .layer(allow_headers)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin_prefix = %self.state.admin_prefix(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
