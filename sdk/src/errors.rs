//! Error types and handling
//!
//! This module provides the error types used throughout the triage engine.
//! All errors implement the `EngineErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Hints are static strings. They never echo the symptom text, API keys or
//! file system paths back to the caller.

use thiserror::Error;

/// Trait for engine error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait EngineErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain:
    /// - Secrets (API keys, tokens)
    /// - File paths
    /// - The user's symptom text
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require a configuration change or restart.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// Advisor failures (upstream unavailable / upstream error) are deliberately
/// absent: they are absorbed by the triage orchestrator and never reach
/// callers. What remains is everything a caller can actually observe.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, EngineErrorExt};
///
/// let error = EngineError::Validation("symptom text is empty".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let storage = EngineError::Storage("disk full".to_string());
/// assert!(!storage.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Conversation log errors
    #[error("Conversation log error: {0}")]
    Storage(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Validation(_) => "Please describe your symptoms before submitting",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Storage(_) => "Conversation history could not be saved or read",
            Self::Database(_) => "Database operation failed. Try restarting the server",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::PathCanonicalization(_, _) => "Invalid path specified",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) | Self::Storage(_) | Self::PathCanonicalization(_, _) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
