//! Durable hostname → rule mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{SimError, SimResult};
use crate::rules::types::Rule;

/// Hostname-keyed rules. `BTreeMap` keeps the file output byte-stable.
pub type RuleSet = BTreeMap<String, Rule>;

/// Whole-file JSON store for hostname rules.
///
/// Reads always go to disk so edits made through the admin API (or by hand)
/// are visible to the next request. Mutations serialize through `write_lock`
/// and replace the file via a temporary sibling and `rename`.
#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every rule. Missing, unreadable or corrupt files yield an empty set;
    /// individual entries that fail validation are skipped.
    pub async fn load(&self) -> RuleSet {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RuleSet::new(),
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to read rule store");
                return RuleSet::new();
            }
        };
        if content.trim().is_empty() {
            return RuleSet::new();
        }

        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Rule store is corrupt, ignoring it");
                return RuleSet::new();
            }
        };

        raw.into_iter()
            .filter_map(|(hostname, value)| match serde_json::from_value::<Rule>(value) {
                Ok(rule) => Some((hostname, rule)),
                Err(e) => {
                    tracing::warn!(hostname = %hostname, error = %e, "Skipping invalid rule");
                    None
                }
            })
            .collect()
    }

    /// Look up the rule for an already-normalized hostname.
    pub async fn get(&self, hostname: &str) -> Option<Rule> {
        if hostname.is_empty() {
            return None;
        }
        self.load().await.remove(hostname)
    }

    /// Replace the whole durable document.
    pub async fn save(&self, rules: &RuleSet) -> SimResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(rules).await
    }

    /// Create or replace the rule for `hostname` (last write wins).
    pub async fn upsert(&self, hostname: String, rule: Rule) -> SimResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut rules = self.load().await;
        rules.insert(hostname, rule);
        self.write(&rules).await
    }

    /// Delete the rule for `hostname`, failing with `NotFound` when absent.
    pub async fn remove(&self, hostname: &str) -> SimResult<Rule> {
        let _guard = self.write_lock.lock().await;
        let mut rules = self.load().await;
        let removed = rules
            .remove(hostname)
            .ok_or_else(|| SimError::NotFound("Rule not found".into()))?;
        self.write(&rules).await?;
        Ok(removed)
    }

    async fn write(&self, rules: &RuleSet) -> SimResult<()> {
        write_json_atomic(&self.path, rules).await?;
        tracing::debug!(path = ?self.path, count = rules.len(), "Rule store saved");
        Ok(())
    }
}

/// Pretty-print `value` to `path` through a `.tmp` sibling and a rename.
pub(crate) async fn write_json_atomic<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> SimResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::status::HttpStatus;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> RuleStore {
        RuleStore::new(dir.path().join("domain-rules.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"good.example": {"type": "status", "code": "404"},
                "bad.example": {"type": "status", "code": 299}}"#,
        )
        .unwrap();
        let rules = store.load().await;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules["good.example"].code(), HttpStatus::NotFound);
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .upsert("a.example".into(), Rule::Status { code: HttpStatus::Gone })
            .await
            .unwrap();
        store
            .upsert("a.example".into(), Rule::Status { code: HttpStatus::BadGateway })
            .await
            .unwrap();
        assert_eq!(store.get("a.example").await.unwrap().code(), HttpStatus::BadGateway);

        store.remove("a.example").await.unwrap();
        let err = store.remove("a.example").await.unwrap_err();
        assert!(matches!(err, SimError::NotFound(_)));
        assert!(store.get("a.example").await.is_none());
    }

    #[tokio::test]
    async fn test_save_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut rules = RuleSet::new();
        rules.insert("z.example".into(), Rule::Status { code: HttpStatus::Ok });
        rules.insert(
            "a.example".into(),
            Rule::Redirect { code: HttpStatus::Found, target: "https://b.example/".into() },
        );

        store.save(&rules).await.unwrap();
        let first = std::fs::read(store.path()).unwrap();
        store.save(&rules).await.unwrap();
        let second = std::fs::read(store.path()).unwrap();
        assert_eq!(first, second);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .upsert(format!("host{}.example", i), Rule::Status { code: HttpStatus::Ok })
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.load().await.len(), 20);
    }
}
