//! JSON file backed cache store.
//!
//! Layout on disk:
//!
//! ```json
//! { "items": { "<cache key>": { "answer": "...", "title": "...", "url": "..." } } }
//! ```
//!
//! Readers also accept the unwrapped `{ "<cache key>": {...} }` form and
//! bare-string entries. Writers always emit the wrapped form.

use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CacheEntry, CacheStore};
use crate::error::CacheError;

/// Wrapper key for the top-level object.
const ITEMS_KEY: &str = "items";

/// Cache store persisted as a single JSON file.
///
/// All writes go through a store-level lock and replace the file atomically
/// (temp file in the same directory, then rename), so concurrent sessions
/// in one process never lose each other's updates and readers never see a
/// partially written file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, CacheError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_items(&path))
            .await
            .map_err(|e| CacheError::Task {
                message: e.to_string(),
            })?
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.load().await {
            Ok(items) => {
                let entry = items.get(key).and_then(decode_entry);
                debug!(key, hit = entry.is_some(), "cache lookup");
                entry
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache unreadable, treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let mut items = load_items(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache contents");
                Map::new()
            });
            items.insert(key, serde_json::to_value(&entry)?);
            write_atomic(&path, &json!({ ITEMS_KEY: items }))
        })
        .await
        .map_err(|e| CacheError::Task {
            message: e.to_string(),
        })?
    }

    async fn entries(&self) -> Vec<(String, CacheEntry)> {
        match self.load().await {
            Ok(items) => items
                .iter()
                .filter_map(|(k, v)| decode_entry(v).map(|e| (k.clone(), e)))
                .collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache unreadable");
                Vec::new()
            }
        }
    }
}

/// Reads the item map from `path`.
///
/// A missing or blank file is an empty map. Anything that is not a JSON
/// object (or whose `items` wrapper is not an object) is [`CacheError::Corrupt`].
fn load_items(path: &Path) -> Result<Map<String, Value>, CacheError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(mut top) => match top.remove(ITEMS_KEY) {
            Some(Value::Object(items)) => Ok(items),
            Some(other) => Err(CacheError::Corrupt {
                message: format!("`items` is {}, expected an object", kind_of(&other)),
            }),
            None => Ok(top),
        },
        other => Err(CacheError::Corrupt {
            message: format!("top level is {}, expected an object", kind_of(&other)),
        }),
    }
}

/// Decodes one stored value. Empty answers are treated as absent.
fn decode_entry(value: &Value) -> Option<CacheEntry> {
    let entry = match value {
        Value::String(answer) => CacheEntry {
            answer: answer.clone(),
            ..CacheEntry::default()
        },
        Value::Object(obj) => {
            let field = |name: &str| {
                obj.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            CacheEntry {
                answer: field("answer"),
                title: field("title"),
                url: field("url"),
            }
        }
        _ => return None,
    };

    (!entry.answer.is_empty()).then_some(entry)
}

fn write_atomic(path: &Path, data: &Value) -> Result<(), CacheError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, data)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
