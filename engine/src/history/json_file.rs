//! `conversations.json` backend
//!
//! The file holds a single document:
//!
//! ```json
//! { "conversations": [ { "user": "...", "response": "...", "severity": "mild", "timestamp": "..." } ] }
//! ```
//!
//! Every append takes an exclusive lock on a `<file>.lock` sidecar, re-reads
//! the document, pushes the entry and replaces the file through a uniquely
//! named temp file in the same directory. The sidecar lock is held across the
//! whole read-modify-write, so appends from other handles or other processes
//! (e.g. the CLI while the server runs) are never lost, and readers only ever
//! see complete documents.

use super::ConversationLog;
use async_trait::async_trait;
use fs2::FileExt;
use sdk::errors::EngineError;
use sdk::types::ConversationEntry;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConversationsDocument {
    #[serde(default)]
    conversations: Vec<ConversationEntry>,
}

/// Conversation log persisted as a JSON document
pub struct JsonFileLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileLog {
    /// Log stored at `path`; the file is created on first append
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run blocking file work off the async runtime
    async fn blocking<T, F>(&self, work: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, EngineError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || work(&path))
            .await
            .map_err(|e| EngineError::Storage(format!("Conversation log task failed: {}", e)))?
    }
}

/// Exclusive advisory lock on the sidecar file, released on drop
struct SidecarLock {
    file: File,
}

impl SidecarLock {
    fn acquire(path: &Path) -> Result<Self, EngineError> {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(PathBuf::from(lock_path))
            .map_err(|e| EngineError::Storage(format!("Failed to open log lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| EngineError::Storage(format!("Failed to lock conversation log: {}", e)))?;

        Ok(Self { file })
    }
}

impl Drop for SidecarLock {
    fn drop(&mut self) {
        // The lock file is left in place for the next writer
        let _ = FileExt::unlock(&self.file);
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn load(path: &Path) -> Result<ConversationsDocument, EngineError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConversationsDocument::default());
        }
        Err(e) => {
            return Err(EngineError::Storage(format!(
                "Failed to read conversation log: {}",
                e
            )))
        }
    };

    if contents.trim().is_empty() {
        return Ok(ConversationsDocument::default());
    }

    serde_json::from_str(&contents)
        .map_err(|e| EngineError::Storage(format!("Conversation log is not valid JSON: {}", e)))
}

fn persist(path: &Path, document: &ConversationsDocument) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(document).map_err(|e| {
        EngineError::Storage(format!("Failed to serialize conversation log: {}", e))
    })?;

    let write_error =
        |e: std::io::Error| EngineError::Storage(format!("Failed to write conversation log: {}", e));

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(write_error)?;
    tmp.write_all(json.as_bytes()).map_err(write_error)?;
    tmp.as_file().sync_all().map_err(write_error)?;

    tmp.persist(path).map_err(|e| {
        EngineError::Storage(format!("Failed to replace conversation log: {}", e.error))
    })?;

    Ok(())
}

fn append_locked(path: &Path, entry: ConversationEntry) -> Result<(), EngineError> {
    std::fs::create_dir_all(parent_dir(path))
        .map_err(|e| EngineError::Storage(format!("Failed to create log directory: {}", e)))?;

    let _lock = SidecarLock::acquire(path)?;

    // A corrupt file is reported rather than overwritten
    let mut document = load(path)?;
    document.conversations.push(entry);
    persist(path, &document)
}

#[async_trait]
impl ConversationLog for JsonFileLog {
    fn backend(&self) -> &str {
        "json"
    }

    async fn append(&self, entry: ConversationEntry) -> Result<(), EngineError> {
        let _guard = self.lock.lock().await;
        self.blocking(move |path| append_locked(path, entry)).await
    }

    async fn read_all(&self) -> Result<Vec<ConversationEntry>, EngineError> {
        let document = self.blocking(load).await?;
        Ok(document.conversations)
    }
}
