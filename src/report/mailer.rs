//! Weekly report delivery.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access_log::export::to_csv;
use crate::access_log::AccessLogStore;
use crate::error::{SimError, SimResult};
use crate::report::aggregator::{weekly_entries, weekly_report, WeeklyReport};
use crate::report::email_config::{EmailConfig, EmailConfigStore};

pub const RESEND_API_BASE: &str = "https://api.resend.com";
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Outbound channel for weekly reports.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send(&self, config: &EmailConfig, report: &WeeklyReport, csv: &str) -> SimResult<()>;
}

#[derive(Serialize)]
struct Attachment {
    filename: String,
    content: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: String,
    text: String,
    attachments: Vec<Attachment>,
}

/// Resend HTTP API client.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
}

impl ResendMailer {
    pub fn new() -> Self {
        Self::with_base_url(RESEND_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ResendMailer {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-text digest of a weekly report.
pub fn render_text(report: &WeeklyReport) -> String {
    let stats = &report.stats;
    let mut out = format!(
        "Weekly analytics {} to {}\n\nTotal hits: {}\nUnique hostnames: {}\n",
        report.period.from, report.period.to, stats.total_hits, stats.unique_hostnames
    );

    out.push_str("\nTop hostnames:\n");
    for h in &stats.top_hostnames {
        out.push_str(&format!("  {} ({}) {}\n", h.hostname, h.rule_type.as_str(), h.count));
    }
    out.push_str("\nTop paths:\n");
    for p in &stats.top_paths {
        out.push_str(&format!("  {} {}\n", p.key, p.count));
    }
    out.push_str("\nTop status codes:\n");
    for s in &stats.top_status_codes {
        out.push_str(&format!("  {} {}\n", s.key, s.count));
    }
    out.push_str("\nTop user agents:\n");
    for u in &stats.top_user_agents {
        out.push_str(&format!("  {} {}\n", u.key, u.count));
    }
    out
}

#[async_trait]
impl ReportMailer for ResendMailer {
    async fn send(&self, config: &EmailConfig, report: &WeeklyReport, csv: &str) -> SimResult<()> {
        let body = SendRequest {
            from: config.from_address(),
            to: [config.recipient.as_str()],
            subject: format!(
                "Weekly analytics report {} to {}",
                report.period.from, report.period.to
            ),
            text: render_text(report),
            attachments: vec![Attachment {
                filename: format!("hostsim-weekly-{}.csv", report.period.to),
                content: base64::engine::general_purpose::STANDARD.encode(csv),
            }],
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&config.resend.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SimError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, detail = %detail, "Report provider rejected message");
            return Err(SimError::Mail(format!("provider returned {}", status)));
        }

        tracing::info!(recipient = %config.recipient, "Weekly report sent");
        Ok(())
    }
}

/// Build this week's report and hand it to `mailer`.
pub async fn deliver_weekly_report(
    mailer: &dyn ReportMailer,
    email: &EmailConfigStore,
    logs: &AccessLogStore,
    now: DateTime<Utc>,
) -> SimResult<WeeklyReport> {
    let config = email.load().await;
    if !config.is_deliverable() {
        return Err(SimError::Validation(
            "Email reporting is disabled or not configured".to_string(),
        ));
    }

    let entries = logs.load_all().await;
    let report = weekly_report(&entries, now)
        .ok_or_else(|| SimError::NotFound("No access logs in the last 7 days".to_string()))?;
    let csv = to_csv(&weekly_entries(&entries, now))?;

    mailer.send(&config, &report, &csv).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::{AccessLogEntry, RuleKind};
    use crate::report::email_config::EmailConfigUpdate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn configured_store(dir: &std::path::Path) -> EmailConfigStore {
        let store = EmailConfigStore::new(dir.join("email-config.json"));
        let update: EmailConfigUpdate = serde_json::from_value(json!({
            "enabled": true,
            "recipient": "ops@example.com",
            "sender": "Status Bot",
            "senderEmail": "bot@example.com",
            "resend": {"apiKey": "re_test"}
        }))
        .unwrap();
        store.update(update).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_disabled_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let email = EmailConfigStore::new(dir.path().join("email-config.json"));
        let logs = AccessLogStore::new(dir.path().join("access-logs.json"));
        let mailer = ResendMailer::with_base_url("http://127.0.0.1:9");

        let err = deliver_weekly_report(&mailer, &email, &logs, Utc::now()).await.unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_data_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let email = configured_store(dir.path()).await;
        let logs = AccessLogStore::new(dir.path().join("access-logs.json"));
        let mailer = ResendMailer::with_base_url("http://127.0.0.1:9");

        let err = deliver_weekly_report(&mailer, &email, &logs, Utc::now()).await.unwrap_err();
        assert!(matches!(err, SimError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sends_to_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(json!({
                "from": "Status Bot <bot@example.com>",
                "to": ["ops@example.com"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let email = configured_store(dir.path()).await;
        let logs = AccessLogStore::new(dir.path().join("access-logs.json"));
        logs.append(AccessLogEntry::now(
            "api.example", "/", Some("curl"), "10.0.0.1", 503, RuleKind::Status, None,
        ))
        .await
        .unwrap();

        let mailer = ResendMailer::with_base_url(server.uri());
        let report = deliver_weekly_report(&mailer, &email, &logs, Utc::now()).await.unwrap();
        assert_eq!(report.stats.total_hits, 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_mail_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let email = configured_store(dir.path()).await;
        let logs = AccessLogStore::new(dir.path().join("access-logs.json"));
        logs.append(AccessLogEntry::now(
            "api.example", "/", None, "10.0.0.1", 404, RuleKind::Status, None,
        ))
        .await
        .unwrap();

        let mailer = ResendMailer::with_base_url(server.uri());
        let err = deliver_weekly_report(&mailer, &email, &logs, Utc::now()).await.unwrap_err();
        assert!(matches!(err, SimError::Mail(_)));
    }
}
