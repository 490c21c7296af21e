//! Per-sender conversation history
//!
//! Keeps the most recent [`HISTORY_CAP`] turns for each sender. The file
//! backend writes one JSON file per sender with no locking: two concurrent
//! appends for the same sender may lose one of them (last write wins).
//!
//! Storage layout (file backend):
//! - `{history_dir}/{percent-encoded sender}.json` - JSON array of turns, oldest first
//!
//! Writes go to a sibling `.tmp` file that is renamed into place.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::error::{JarvisError, Result};
use crate::types::ChatTurn;

/// Maximum number of turns retained per sender
pub const HISTORY_CAP: usize = 20;

/// Key-value store of conversation turns by sender
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Turns for `sender_id`, oldest first; empty when none were stored
    async fn load(&self, sender_id: &str) -> Result<Vec<ChatTurn>>;

    /// Append turns, dropping the oldest beyond the cap
    async fn append(&self, sender_id: &str, turns: Vec<ChatTurn>) -> Result<()>;
}

/// Keep only the last `HISTORY_CAP` turns
fn cap(turns: &mut Vec<ChatTurn>) {
    if turns.len() > HISTORY_CAP {
        let excess = turns.len() - HISTORY_CAP;
        turns.drain(..excess);
    }
}

// ============================================================================
// File Backend
// ============================================================================

/// One JSON file per sender under a directory
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Gateway sender ids look like `whatsapp:+40712345678`; percent-encode them
    /// so distinct ids never share a file and none contains a path separator
    fn path_for(&self, sender_id: &str) -> PathBuf {
        let name = if sender_id.is_empty() {
            "anonymous".to_string()
        } else {
            urlencoding::encode(sender_id).into_owned()
        };
        self.dir.join(format!("{}.json", name))
    }

    /// Raw file contents; `None` when the sender has no file yet
    async fn read(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JarvisError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

fn parse(path: &Path, data: &str) -> Result<Vec<ChatTurn>> {
    serde_json::from_str(data).map_err(|e| {
        JarvisError::Storage(format!("Corrupt history file {}: {}", path.display(), e))
    })
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self, sender_id: &str) -> Result<Vec<ChatTurn>> {
        let path = self.path_for(sender_id);
        match self.read(&path).await? {
            Some(data) => parse(&path, &data),
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, sender_id: &str, turns: Vec<ChatTurn>) -> Result<()> {
        let path = self.path_for(sender_id);

        // A corrupt file is replaced rather than blocking every later write
        let mut history = match self.read(&path).await? {
            Some(data) => parse(&path, &data).unwrap_or_else(|e| {
                warn!(sender = sender_id, error = %e, "discarding unreadable history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        history.extend(turns);
        cap(&mut history);

        tokio::fs::create_dir_all(&self.dir).await?;
        let data = serde_json::to_string_pretty(&history)
            .map_err(|e| JarvisError::Storage(e.to_string()))?;

        // Write then rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

// ============================================================================
// Memory Backend
// ============================================================================

/// In-process store, for tests and the one-shot CLI
#[derive(Default)]
pub struct MemoryHistoryStore {
    turns: Mutex<HashMap<String, Vec<ChatTurn>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<ChatTurn>>>> {
        self.turns
            .lock()
            .map_err(|_| JarvisError::Storage("history lock poisoned".to_string()))
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, sender_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self.lock()?.get(sender_id).cloned().unwrap_or_default())
    }

    async fn append(&self, sender_id: &str, turns: Vec<ChatTurn>) -> Result<()> {
        let mut map = self.lock()?;
        let history = map.entry(sender_id.to_string()).or_default();
        history.extend(turns);
        cap(history);
        Ok(())
    }
}
