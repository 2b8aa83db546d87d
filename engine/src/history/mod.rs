//! Conversation log
//!
//! Append-only, ordered record of triage exchanges. The orchestrator only
//! needs two operations, `append` and `read_all`; everything else is the
//! backend's concern. Each backend guards its own writes so concurrent
//! appends never interleave and readers never observe a partial entry.

use crate::config::{Config, HistoryBackend};
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::ConversationEntry;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod json_file;

pub use json_file::JsonFileLog;

/// Storage contract consumed by the triage engine
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// Backend name for diagnostics ("memory", "json", "sqlite")
    fn backend(&self) -> &str;

    /// Append one entry; called at most once per triage
    async fn append(&self, entry: ConversationEntry) -> Result<(), EngineError>;

    /// Every entry appended so far, oldest first
    async fn read_all(&self) -> Result<Vec<ConversationEntry>, EngineError>;

    /// Flush and release backend resources at shutdown
    async fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Process-lifetime conversation log
#[derive(Default)]
pub struct MemoryLog {
    entries: RwLock<Vec<ConversationEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationLog for MemoryLog {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn append(&self, entry: ConversationEntry) -> Result<(), EngineError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ConversationEntry>, EngineError> {
        Ok(self.entries.read().await.clone())
    }
}

/// Open the log selected by `history.backend`
pub async fn open_log(config: &Config) -> Result<Arc<dyn ConversationLog>, EngineError> {
    let path = config.history_path();

    let log: Arc<dyn ConversationLog> = match config.history.backend {
        HistoryBackend::Memory => Arc::new(MemoryLog::new()),
        HistoryBackend::Json => Arc::new(JsonFileLog::new(&path)),
        HistoryBackend::Sqlite => {
            let database = crate::db::Database::new(&path).await?;
            Arc::new(database.conversations())
        }
    };

    tracing::info!(
        "Conversation log: {} ({})",
        log.backend(),
        if config.history.backend == HistoryBackend::Memory {
            "in memory".to_string()
        } else {
            path.display().to_string()
        }
    );

    Ok(log)
}
