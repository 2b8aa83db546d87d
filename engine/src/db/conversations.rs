/// Conversation log stored in the `conversations` table
///
/// Rows are ordered by their autoincrement id, which SQLite assigns under its
/// write lock, so concurrent appends keep a single total order.
use super::Database;
use crate::history::ConversationLog;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sdk::errors::EngineError;
use sdk::types::{ConversationEntry, Severity};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub struct SqliteLog {
    db: Database,
}

impl SqliteLog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<ConversationEntry, EngineError> {
    let column_error =
        |e: sqlx::Error| EngineError::Storage(format!("Malformed conversation row: {}", e));

    let severity: String = row.try_get("severity").map_err(column_error)?;
    let created_at: String = row.try_get("created_at").map_err(column_error)?;

    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            EngineError::Storage(format!("Invalid timestamp '{}' in conversations: {}", created_at, e))
        })?
        .with_timezone(&Utc);

    Ok(ConversationEntry {
        user: row.try_get("user_text").map_err(column_error)?,
        response: row.try_get("response_text").map_err(column_error)?,
        severity: severity
            .parse::<Severity>()
            .map_err(|e| EngineError::Storage(e.to_string()))?,
        timestamp,
    })
}

#[async_trait]
impl ConversationLog for SqliteLog {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, entry: ConversationEntry) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO conversations (user_text, response_text, severity, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.user)
        .bind(&entry.response)
        .bind(entry.severity.as_str())
        .bind(entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Storage(format!("Failed to record conversation: {}", e)))?;

        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ConversationEntry>, EngineError> {
        let rows = sqlx::query(
            "SELECT user_text, response_text, severity, created_at FROM conversations ORDER BY id ASC",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| EngineError::Storage(format!("Failed to read conversations: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.db.close().await
    }
}
