//! Report email settings persisted beside the other stores.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::SimResult;
use crate::rules::store::write_json_atomic;

/// Placeholder shown instead of a stored API key.
pub const MASKED_KEY: &str = "***";
pub const DEFAULT_SENDER_EMAIL: &str = "noreply@hostsim.local";
pub const DEFAULT_SENDER_NAME: &str = "hostsim Analytics";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResendSettings {
    pub api_key: String,
}

/// Weekly report delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub resend: ResendSettings,
    pub recipient: String,
    /// Display name shown in the `From` header.
    pub sender: String,
    pub sender_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            resend: ResendSettings::default(),
            recipient: String::new(),
            sender: DEFAULT_SENDER_NAME.to_string(),
            sender_email: DEFAULT_SENDER_EMAIL.to_string(),
        }
    }
}

/// Admin update payload. The key is only replaced when a real value is sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfigUpdate {
    pub enabled: Option<bool>,
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub sender_email: Option<String>,
    pub resend: Option<ResendUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResendUpdate {
    pub api_key: Option<String>,
}

impl EmailConfig {
    /// Copy safe to hand to the browser.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.resend.api_key.is_empty() {
            copy.resend.api_key = MASKED_KEY.to_string();
        }
        copy
    }

    /// Enabled, addressed and keyed.
    pub fn is_deliverable(&self) -> bool {
        self.enabled && !self.recipient.is_empty() && !self.resend.api_key.is_empty()
    }

    /// `Name <address>` for the outgoing message.
    pub fn from_address(&self) -> String {
        format!("{} <{}>", self.sender, self.sender_email)
    }

    pub fn apply(&mut self, update: EmailConfigUpdate) {
        self.enabled = update.enabled.unwrap_or(false);
        self.recipient = update.recipient.unwrap_or_default();
        self.sender = update
            .sender
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());
        self.sender_email = update
            .sender_email
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_EMAIL.to_string());

        if let Some(key) = update
            .resend
            .and_then(|r| r.api_key)
            .filter(|k| !k.is_empty() && k != MASKED_KEY)
        {
            self.resend.api_key = key;
        }
    }
}

/// Whole-file store for [`EmailConfig`].
#[derive(Debug)]
pub struct EmailConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl EmailConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or the defaults when missing or unreadable.
    pub async fn load(&self) -> EmailConfig {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::error!(path = ?self.path, error = %e, "Email config is corrupt, using defaults");
                EmailConfig::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => EmailConfig::default(),
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to read email config");
                EmailConfig::default()
            }
        }
    }

    /// Apply an admin update under the write lock and persist it.
    pub async fn update(&self, update: EmailConfigUpdate) -> SimResult<EmailConfig> {
        let _guard = self.write_lock.lock().await;
        let mut config = self.load().await;
        config.apply(update);
        write_json_atomic(&self.path, &config).await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_masking() {
        let mut config = EmailConfig::default();
        assert_eq!(config.masked().resend.api_key, "");
        config.resend.api_key = "re_live_123".into();
        assert_eq!(config.masked().resend.api_key, MASKED_KEY);
        assert_eq!(config.resend.api_key, "re_live_123");
    }

    #[test]
    fn test_masked_key_does_not_overwrite() {
        let mut config = EmailConfig::default();
        config.resend.api_key = "re_live_123".into();

        let update: EmailConfigUpdate = serde_json::from_value(json!({
            "enabled": true,
            "recipient": "ops@example.com",
            "resend": {"apiKey": "***"}
        }))
        .unwrap();
        config.apply(update);

        assert!(config.is_deliverable());
        assert_eq!(config.resend.api_key, "re_live_123");
        assert_eq!(config.sender_email, DEFAULT_SENDER_EMAIL);
        assert_eq!(config.from_address(), "hostsim Analytics <noreply@hostsim.local>");
    }

    #[test]
    fn test_sender_name_is_applied() {
        let mut config = EmailConfig::default();
        let update: EmailConfigUpdate = serde_json::from_value(json!({
            "enabled": true,
            "recipient": "ops@example.com",
            "sender": "Status Bot",
            "senderEmail": "bot@example.com"
        }))
        .unwrap();
        config.apply(update);
        assert_eq!(config.from_address(), "Status Bot <bot@example.com>");

        config.apply(EmailConfigUpdate { sender: Some("  ".into()), ..Default::default() });
        assert_eq!(config.sender, DEFAULT_SENDER_NAME);
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmailConfigStore::new(dir.path().join("email-config.json"));
        assert_eq!(store.load().await, EmailConfig::default());

        let update: EmailConfigUpdate = serde_json::from_value(json!({
            "enabled": true,
            "recipient": "ops@example.com",
            "resend": {"apiKey": "re_key"}
        }))
        .unwrap();
        store.update(update).await.unwrap();

        let loaded = store.load().await;
        assert!(loaded.enabled);
        assert_eq!(loaded.resend.api_key, "re_key");
    }
}
