//! Access log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which mechanism produced a logged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Status,
    Redirect,
    HostnameOverride,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Status => "status",
            RuleKind::Redirect => "redirect",
            RuleKind::HostnameOverride => "hostname-override",
        }
    }
}

/// One immutable access fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub path: String,
    #[serde(default = "unknown_agent")]
    pub user_agent: String,
    pub ip: String,
    pub status_code: u16,
    pub rule_type: RuleKind,
    #[serde(default)]
    pub target: Option<String>,
}

fn unknown_agent() -> String {
    "Unknown".to_string()
}

impl AccessLogEntry {
    /// Build an entry stamped with the current time.
    pub fn now(
        hostname: impl Into<String>,
        path: impl Into<String>,
        user_agent: Option<&str>,
        ip: impl Into<String>,
        status_code: u16,
        rule_type: RuleKind,
        target: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            hostname: hostname.into(),
            path: path.into(),
            user_agent: user_agent
                .filter(|ua| !ua.is_empty())
                .map(str::to_string)
                .unwrap_or_else(unknown_agent),
            ip: ip.into(),
            status_code,
            rule_type,
            target,
        }
    }
}

/// On-disk wrapper: `{"logs": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogDocument {
    #[serde(default)]
    pub logs: Vec<AccessLogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let entry = AccessLogEntry::now("a.example", "/x", None, "10.0.0.1", 503, RuleKind::Status, None);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["userAgent"], "Unknown");
        assert_eq!(value["statusCode"], 503);
        assert_eq!(value["ruleType"], "status");
        assert!(value["target"].is_null());
    }

    #[test]
    fn test_parses_legacy_entries() {
        let doc: LogDocument = serde_json::from_value(json!({
            "logs": [{
                "timestamp": "2025-03-10T08:15:00.000Z",
                "hostname": "old.example",
                "path": "/",
                "userAgent": "curl/8.0",
                "ip": "::1",
                "statusCode": 301,
                "ruleType": "redirect",
                "target": "https://new.example"
            }]
        }))
        .unwrap();
        assert_eq!(doc.logs[0].rule_type, RuleKind::Redirect);
        assert_eq!(doc.logs[0].target.as_deref(), Some("https://new.example"));
    }
}
