//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use hostsim::report::{ReportMailer, ResendMailer};
use hostsim::{AppState, HttpServer, Shutdown, SimConfig};
use reqwest::redirect::Policy;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_PASSWORD: &str = "s3cret-test-password";
pub const PREFIX: &str = "/control-panel";

/// A running server bound to an ephemeral port with its own data directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in and return the `Cookie` header value for the session.
    pub async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url(&format!("{PREFIX}/login")))
            .form(&[("password", TEST_PASSWORD)])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 302);
        session_cookie(&res).expect("login should set the session cookie")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// `admin-session=<token>` from a response's `Set-Cookie`, if present.
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|c| c.starts_with("admin-session="))
        .map(str::to_string)
}

/// Start a server whose report mailer never reaches a real provider.
pub async fn spawn_server() -> TestServer {
    spawn_server_with(Arc::new(ResendMailer::with_base_url("http://127.0.0.1:9")), |_| {}).await
}

/// Start a server with a custom mailer and config tweaks.
pub async fn spawn_server_with(
    mailer: Arc<dyn ReportMailer>,
    configure: impl FnOnce(&mut SimConfig),
) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SimConfig::default();
    config.admin.password = TEST_PASSWORD.to_string();
    config.storage.data_dir = dir.path().to_path_buf();
    configure(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState::new(config, mailer);
    let server = HttpServer::with_state(state.clone());
    let shutdown = Shutdown::new();
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestServer {
        addr,
        state,
        client,
        shutdown,
        _dir: dir,
    }
}
