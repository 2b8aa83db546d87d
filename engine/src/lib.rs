//! Triage Engine Library
//!
//! Core of the symptom triage assistant: the keyword fallback classifier,
//! the model-backed advisor, the orchestrator that always produces advice,
//! and the conversation log. Used by the `triage` CLI, the API server and
//! integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Model-backed advisor
pub mod llm;

/// Fallback classifier and triage orchestrator
pub mod triage;

/// Conversation log backends
pub mod history;

/// SQLite persistence module
pub mod db;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
