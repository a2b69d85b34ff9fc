//! Admin control panel.
//!
//! # Data Flow
//! ```text
//! {prefix}, {prefix}/            → handlers::dashboard (login form without a session)
//! {prefix}/stats, {prefix}/email → page, or 302 → {prefix}
//! POST {prefix}/login            → session.rs (check password, create token) → Set-Cookie
//! {prefix}/logout                → session.rs (destroy) → clear cookie, 302 → /
//! {prefix}/api/...               → auth::require_session → handlers (JSON API)
//! anything else under {prefix}   → 401
//! ```
//!
//! # Design Decisions
//! - Sessions live only in memory; a restart logs everyone out
//! - Every route's method fallback is 401 so the admin surface never reveals
//!   which methods exist

pub mod auth;
pub mod handlers;
pub mod pages;
pub mod session;

use axum::{
    middleware,
    routing::{any, get, post, MethodRouter},
    Router,
};

use crate::http::server::AppState;

use self::auth::require_session;
use self::handlers::*;

pub use session::SessionGuard;

fn guarded(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(unauthorized)
}

/// Admin pages and API mounted under `prefix`.
pub fn admin_router(prefix: &str, state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .route(
            &format!("{prefix}/api/rules"),
            guarded(get(list_rules).post(add_rule)),
        )
        .route(
            &format!("{prefix}/api/rules/{{hostname}}"),
            guarded(axum::routing::delete(delete_rule)),
        )
        .route(&format!("{prefix}/api/logs/export"), guarded(get(export_logs)))
        .route(
            &format!("{prefix}/api/logs/clear"),
            guarded(axum::routing::delete(clear_logs)),
        )
        .route(&format!("{prefix}/api/stats"), guarded(get(stats)))
        .route(&format!("{prefix}/api/report"), guarded(get(report)))
        .route(
            &format!("{prefix}/api/email"),
            guarded(get(get_email_config).post(save_email_config)),
        )
        .route(&format!("{prefix}/api/email/test"), guarded(post(send_test_report)))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route(prefix, guarded(get(dashboard)))
        .route(&format!("{prefix}/"), guarded(get(dashboard)))
        .route(&format!("{prefix}/stats"), guarded(get(stats_page)))
        .route(&format!("{prefix}/stats/"), guarded(get(stats_page)))
        .route(&format!("{prefix}/email"), guarded(get(email_page)))
        .route(&format!("{prefix}/email/"), guarded(get(email_page)))
        .route(&format!("{prefix}/login"), guarded(post(login)))
        .route(&format!("{prefix}/logout"), any(logout))
        .merge(api)
}
