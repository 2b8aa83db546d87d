//! Integration tests for the conversation log backends

use chrono::Utc;
use sdk::errors::EngineError;
use sdk::types::{ConversationEntry, Severity};
use std::sync::Arc;
use tempfile::TempDir;
use triage_engine::config::{Config, HistoryBackend};
use triage_engine::history::{open_log, ConversationLog, JsonFileLog};

fn entry(user: &str) -> ConversationEntry {
    ConversationEntry {
        user: user.to_string(),
        response: format!("advice for {}", user),
        severity: Severity::Mild,
        timestamp: Utc::now(),
    }
}

fn config_for(temp_dir: &TempDir, backend: HistoryBackend) -> Config {
    let mut config = Config::default();
    config.core.data_dir = temp_dir.path().to_path_buf();
    config.history.backend = backend;
    config
}

#[tokio::test]
async fn test_reads_history_written_by_older_releases() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("conversations.json");
    std::fs::write(
        &path,
        r#"{
  "conversations": [
    {
      "user": "I have a headache",
      "response": "Rest in a quiet room.",
      "severity": "mild",
      "timestamp": "2024-03-10T14:22:05.123456"
    }
  ]
}"#,
    )
    .unwrap();

    let log = JsonFileLog::new(&path);
    log.append(entry("cough")).await.unwrap();

    let entries = log.read_all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user, "I have a headache");
    assert_eq!(entries[0].timestamp.to_rfc3339(), "2024-03-10T14:22:05.123456+00:00");
    assert_eq!(entries[1].user, "cough");
}

#[tokio::test]
async fn test_two_handles_on_one_file_keep_both_writers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("conversations.json");

    let first = JsonFileLog::new(&path);
    let second = JsonFileLog::new(&path);

    first.append(entry("from cli")).await.unwrap();
    second.append(entry("from server")).await.unwrap();

    let users: Vec<String> = first
        .read_all()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.user)
        .collect();
    assert_eq!(users, vec!["from cli", "from server"]);
}

#[tokio::test]
async fn test_open_log_for_every_backend() {
    for backend in [HistoryBackend::Memory, HistoryBackend::Json, HistoryBackend::Sqlite] {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir, backend);

        let log: Arc<dyn ConversationLog> = open_log(&config).await.unwrap();
        assert_eq!(log.backend(), backend.as_str());

        log.append(entry("one")).await.unwrap();
        log.append(entry("two")).await.unwrap();

        let users: Vec<String> = log
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user)
            .collect();
        assert_eq!(users, vec!["one", "two"], "backend {}", backend.as_str());

        if backend != HistoryBackend::Memory {
            assert!(config.history_path().exists());
        }
    }
}

#[tokio::test]
async fn test_sqlite_log_survives_reopen_through_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, HistoryBackend::Sqlite);

    {
        let log = open_log(&config).await.unwrap();
        log.append(entry("persisted")).await.unwrap();
    }

    let reopened = open_log(&config).await.unwrap();
    let entries = reopened.read_all().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user, "persisted");
}

#[tokio::test]
async fn test_unreadable_json_is_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, HistoryBackend::Json);
    std::fs::write(config.history_path(), "[1, 2, 3]").unwrap();

    let log = open_log(&config).await.unwrap();
    assert!(matches!(log.read_all().await, Err(EngineError::Storage(_))));
}
