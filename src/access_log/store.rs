//! Append-only access log with size-bounded rotation.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::access_log::entry::{AccessLogEntry, LogDocument};
use crate::error::SimResult;
use crate::observability::metrics;
use crate::rules::store::write_json_atomic;

/// Live log ceiling before rotation kicks in.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
/// Entries kept in the live log after a rotation.
pub const DEFAULT_RETAIN_ENTRIES: usize = 1_000;

/// Whole-file JSON access log.
///
/// Every `append` rewrites the file; once the live log grows past
/// `max_entries`, everything except the newest `retain_entries` records is
/// moved to a dated archive next to it. Archives are created with
/// `create_new` and never rewritten.
#[derive(Debug)]
pub struct AccessLogStore {
    path: PathBuf,
    max_entries: usize,
    retain_entries: usize,
    write_lock: Mutex<()>,
}

impl AccessLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limits(path, DEFAULT_MAX_ENTRIES, DEFAULT_RETAIN_ENTRIES)
    }

    pub fn with_limits(path: impl Into<PathBuf>, max_entries: usize, retain_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
            retain_entries: retain_entries.min(max_entries),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every live entry in insertion order. Degrades to empty on any read error.
    pub async fn load_all(&self) -> Vec<AccessLogEntry> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Failed to read access log");
                return Vec::new();
            }
        };
        if content.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<LogDocument>(&content) {
            Ok(doc) => doc.logs,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Access log is corrupt, ignoring it");
                Vec::new()
            }
        }
    }

    /// Append one entry, rotating afterwards if the ceiling is exceeded.
    ///
    /// Returns the archive path when a rotation happened.
    pub async fn append(&self, entry: AccessLogEntry) -> SimResult<Option<PathBuf>> {
        let _guard = self.write_lock.lock().await;
        let mut logs = self.load_all().await;
        logs.push(entry);

        let mut archived = None;
        if logs.len() > self.max_entries {
            let split = logs.len() - self.retain_entries;
            let live = logs.split_off(split);
            let archive = self.write_archive(&logs, Utc::now().date_naive()).await?;
            tracing::info!(
                archive = ?archive,
                archived = logs.len(),
                retained = live.len(),
                "Access log rotated"
            );
            metrics::record_log_rotation();
            logs = live;
            archived = Some(archive);
        }

        write_json_atomic(&self.path, &LogDocument { logs }).await?;
        Ok(archived)
    }

    /// Empty the live log. Archives are left untouched.
    pub async fn clear(&self) -> SimResult<()> {
        let _guard = self.write_lock.lock().await;
        write_json_atomic(&self.path, &LogDocument::default()).await?;
        tracing::info!(path = ?self.path, "Access log cleared");
        Ok(())
    }

    async fn write_archive(&self, logs: &[AccessLogEntry], date: NaiveDate) -> SimResult<PathBuf> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let bytes = serde_json::to_vec_pretty(&LogDocument { logs: logs.to_vec() })?;

        let base = format!("access-logs-archive-{}", date.format("%Y-%m-%d"));
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{}.json", base)
            } else {
                format!("{}-{}.json", base, attempt)
            };
            let candidate = dir.join(name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&bytes).await?;
                    file.flush().await?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Load an archive file written by a rotation.
pub async fn load_archive(path: &Path) -> SimResult<Vec<AccessLogEntry>> {
    let content = tokio::fs::read_to_string(path).await?;
    let doc: LogDocument = serde_json::from_str(&content)?;
    Ok(doc.logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::entry::RuleKind;

    fn entry(i: usize) -> AccessLogEntry {
        AccessLogEntry::now(
            "a.example",
            format!("/{}", i),
            Some("test-agent"),
            "127.0.0.1",
            503,
            RuleKind::Status,
            None,
        )
    }

    fn write_logs(path: &Path, count: usize) {
        let doc = LogDocument { logs: (0..count).map(entry).collect() };
        std::fs::write(path, serde_json::to_vec(&doc).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessLogStore::new(dir.path().join("access-logs.json"));
        for i in 0..3 {
            assert!(store.append(entry(i)).await.unwrap().is_none());
        }
        let paths: Vec<_> = store.load_all().await.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/0", "/1", "/2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(AccessLogStore::new(dir.path().join("access-logs.json")));

        let mut tasks = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.append(entry(i)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut paths: Vec<_> = store.load_all().await.into_iter().map(|e| e.path).collect();
        assert_eq!(paths.len(), 50);
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 50);
    }

    #[tokio::test]
    async fn test_rotation_at_default_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessLogStore::new(dir.path().join("access-logs.json"));
        write_logs(store.path(), DEFAULT_MAX_ENTRIES);

        // The live log sits exactly at the ceiling; one more append crosses it.
        let archive = store.append(entry(DEFAULT_MAX_ENTRIES)).await.unwrap();
        let archive = archive.expect("append past the ceiling rotates");

        let live = store.load_all().await;
        assert_eq!(live.len(), DEFAULT_RETAIN_ENTRIES);
        assert_eq!(live.last().unwrap().path, format!("/{}", DEFAULT_MAX_ENTRIES));

        let archived = load_archive(&archive).await.unwrap();
        assert_eq!(archived.len(), DEFAULT_MAX_ENTRIES + 1 - DEFAULT_RETAIN_ENTRIES);
        assert_eq!(archived[0].path, "/0");
        // Nothing lost: archive tail meets live head.
        let boundary = DEFAULT_MAX_ENTRIES + 1 - DEFAULT_RETAIN_ENTRIES;
        assert_eq!(archived.last().unwrap().path, format!("/{}", boundary - 1));
        assert_eq!(live[0].path, format!("/{}", boundary));

        let archives = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("access-logs-archive-"))
            .count();
        assert_eq!(archives, 1);
    }

    #[tokio::test]
    async fn test_archives_are_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessLogStore::with_limits(dir.path().join("access-logs.json"), 4, 2);

        let mut archives = Vec::new();
        for i in 0..10 {
            if let Some(path) = store.append(entry(i)).await.unwrap() {
                archives.push(path);
            }
        }
        assert_eq!(archives.len(), 2);
        assert_ne!(archives[0], archives[1]);

        let mut total = store.load_all().await.len();
        for path in &archives {
            total += load_archive(path).await.unwrap().len();
        }
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn test_clear_keeps_archives() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessLogStore::with_limits(dir.path().join("access-logs.json"), 2, 1);
        let mut archive = None;
        for i in 0..3 {
            archive = archive.or(store.append(entry(i)).await.unwrap());
        }
        store.clear().await.unwrap();
        assert!(store.load_all().await.is_empty());
        assert!(archive.unwrap().exists());
    }

    #[tokio::test]
    async fn test_corrupt_log_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccessLogStore::new(dir.path().join("access-logs.json"));
        std::fs::write(store.path(), "[1, 2").unwrap();
        assert!(store.load_all().await.is_empty());
    }
}
