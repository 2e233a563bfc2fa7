//! JSON file backend.
//!
//! Layout under the configured state path:
//! - `conversation_histories.json`: one object holding every shared scope,
//!   keyed by space id.
//! - `dm_histories/<userId>.json`: one file per private scope.
//!
//! Every save rewrites the whole record atomically (temp file + rename).
//! File I/O runs on the blocking pool so the runtime thread never waits on
//! disk.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use gr_domain::config::StorageConfig;
use gr_domain::error::{Error, Result};
use gr_domain::{ConversationScope, Transcript};

use crate::backend::HistoryBackend;

type SharedMap = BTreeMap<String, Value>;

pub struct JsonFileBackend {
    shared_path: PathBuf,
    private_dir: PathBuf,
    /// Serializes read-modify-write cycles on the aggregate file.
    shared_lock: Arc<Mutex<()>>,
}

impl JsonFileBackend {
    /// Create the backend, making sure the directories exist.
    pub fn new(shared_path: &Path, private_dir: &Path) -> Result<Self> {
        if let Some(parent) = shared_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(private_dir)?;

        tracing::info!(
            shared = %shared_path.display(),
            private = %private_dir.display(),
            "history storage ready"
        );

        Ok(Self {
            shared_path: shared_path.to_path_buf(),
            private_dir: private_dir.to_path_buf(),
            shared_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn from_config(cfg: &StorageConfig) -> Result<Self> {
        Self::new(&cfg.shared_path(), &cfg.private_path())
    }

    fn private_path(&self, user_id: u64) -> PathBuf {
        self.private_dir.join(format!("{user_id}.json"))
    }
}

#[async_trait]
impl HistoryBackend for JsonFileBackend {
    async fn load(&self, scope: ConversationScope) -> Result<Transcript> {
        match scope {
            ConversationScope::Shared(id) => {
                let path = self.shared_path.clone();
                let lock = Arc::clone(&self.shared_lock);
                run_blocking(move || {
                    let _guard = lock.lock();
                    let mut map = read_shared_map(&path)?;
                    Ok(map
                        .remove(&id.to_string())
                        .map(|raw| parse_record(raw, scope))
                        .unwrap_or_default())
                })
                .await
            }
            ConversationScope::Private(id) => {
                let path = self.private_path(id);
                run_blocking(move || {
                    let Some(raw) = read_json(&path)? else {
                        return Ok(Transcript::new());
                    };
                    Ok(parse_record(raw, scope))
                })
                .await
            }
        }
    }

    async fn save(&self, scope: ConversationScope, transcript: &Transcript) -> Result<()> {
        let record = serde_json::to_value(transcript)?;
        match scope {
            ConversationScope::Shared(id) => {
                let path = self.shared_path.clone();
                let lock = Arc::clone(&self.shared_lock);
                run_blocking(move || {
                    let _guard = lock.lock();
                    let mut map = read_shared_map(&path)?;
                    map.insert(id.to_string(), record);
                    write_json_atomic(&path, &serde_json::to_value(&map)?)
                })
                .await
            }
            ConversationScope::Private(id) => {
                let path = self.private_path(id);
                run_blocking(move || write_json_atomic(&path, &record)).await
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "json files ({}, {})",
            self.shared_path.display(),
            self.private_dir.display()
        )
    }
}

// ── Private helpers ───────────────────────────────────────────────────

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Storage(format!("spawn_blocking join: {e}")))?
}

/// Read a JSON file. `None` when the file is missing or unparseable.
fn read_json(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read(path)?;
    match serde_json::from_slice::<Value>(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "unreadable history file, treating as empty"
            );
            Ok(None)
        }
    }
}

/// Read the aggregate shared-scope file.
///
/// A file that is not a JSON object is moved aside to `<name>.corrupt` so
/// the next save does not silently destroy it.
fn read_shared_map(path: &Path) -> Result<SharedMap> {
    let Some(value) = read_json(path)? else {
        if path.exists() {
            preserve_corrupt(path);
        }
        return Ok(SharedMap::new());
    };
    match serde_json::from_value::<SharedMap>(value) {
        Ok(map) => Ok(map),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "shared history file is not an object, starting fresh"
            );
            preserve_corrupt(path);
            Ok(SharedMap::new())
        }
    }
}

fn preserve_corrupt(path: &Path) {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupt");
    if let Err(e) = std::fs::rename(path, &backup) {
        tracing::warn!(path = %path.display(), error = %e, "could not move corrupt file aside");
    }
}

/// Decode one scope's record. Malformed records yield an empty transcript.
fn parse_record(raw: Value, scope: ConversationScope) -> Transcript {
    match serde_json::from_value::<Transcript>(raw) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(
                scope = %scope,
                error = %e,
                "malformed transcript record, treating as empty"
            );
            Transcript::new()
        }
    }
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(d) => tempfile::NamedTempFile::new_in(d)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    let buf = serde_json::to_vec_pretty(value)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
