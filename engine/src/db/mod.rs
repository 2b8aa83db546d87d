/// SQLite persistence for the conversation log
///
/// Uses sqlx with WAL mode so the API server and the CLI can share one
/// database file. Schema lives in `engine/migrations` and is applied on open.
use sdk::errors::EngineError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub mod conversations;

pub use conversations::SqliteLog;

/// Database connection pool
///
/// Clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `db_path` and run migrations
    ///
    /// SQLite replays any leftover WAL on open, so a database left behind by
    /// an unclean shutdown needs no extra recovery step here.
    pub async fn new(db_path: &Path) -> Result<Self, EngineError> {
        info!("Initializing database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                EngineError::Database(format!("Failed to create database directory: {}", e))
            })?;
        }

        let connection_string = format!("sqlite:{}", db_path.display());
        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| EngineError::Database(format!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| EngineError::Database(format!("Failed to connect to database: {}", e)))?;

        debug!("Database connection established");

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), EngineError> {
        debug!("Running database migrations");

        sqlx::raw_sql(include_str!("../../migrations/001_conversations.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                EngineError::Database(format!(
                    "Failed to execute migration 001_conversations.sql: {}",
                    e
                ))
            })?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checkpoint the WAL into the main database file
    pub async fn flush_wal(&self) -> Result<(), EngineError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Database(format!("Failed to flush WAL: {}", e)))?;

        debug!("WAL flushed successfully");
        Ok(())
    }

    /// Flush the WAL and close every pooled connection
    ///
    /// Closing is shared by every clone; later queries fail with a pool error.
    pub async fn close(&self) -> Result<(), EngineError> {
        info!("Closing database connection");
        self.flush_wal().await?;
        self.pool.close().await;
        Ok(())
    }

    /// Conversation log sharing this database's pool
    pub fn conversations(&self) -> SqliteLog {
        SqliteLog::new(self.clone())
    }
}
