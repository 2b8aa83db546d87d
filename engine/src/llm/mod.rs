//! Model-backed advice
//!
//! This module defines the contract between the triage orchestrator and an
//! external text-generation service. The [`Advisor`] trait is the seam the
//! orchestrator calls through, so tests can inject fake advisors without any
//! network access.

use async_trait::async_trait;
use sdk::types::TriageResult;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;
pub mod parse;

pub use parse::{parse_severity, SeverityParse};

/// Result type for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Errors that can occur while consulting the external model
///
/// Both variants are absorbed by the orchestrator, which falls back to the
/// deterministic classifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisorError {
    /// No usable credential or no connectivity. Expected; not an error condition.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The call was made but failed, timed out, or returned unusable content.
    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

/// Fixed instruction sent as the system message on every request
pub const SYSTEM_PROMPT: &str = "\
You are a healthcare-guidance assistant. Read the user's symptoms and give short, practical guidance.

For MILD symptoms (common cold, mild headache, minor cuts):
- Suggest home remedies and self-care
- Mention over-the-counter options where appropriate

For SERIOUS symptoms (chest pain, fever above 102°F / 39°C, difficulty breathing, heavy bleeding, loss of consciousness, severe injuries):
- Recommend immediate medical attention
- Advise contacting a doctor or emergency services

Rules:
- Do not give a definitive diagnosis of any condition.
- Include a brief safety disclaimer recommending a qualified healthcare professional.
- Be concise.
- End your reply with exactly one final line, either `SEVERITY: MILD` or `SEVERITY: SERIOUS`.";

/// Wrap raw symptom text as the user message
pub fn user_prompt(symptoms: &str) -> String {
    format!("Symptoms: {}", symptoms)
}

/// Message in a chat-completions request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// The two messages every triage request carries
pub fn triage_messages(symptoms: &str) -> [Message; 2] {
    [Message::system(SYSTEM_PROMPT), Message::user(user_prompt(symptoms))]
}

/// Advisor trait implemented by every model backend
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Returns the name of the backend (e.g., "openai")
    fn name(&self) -> &str;

    /// Whether a credential/configuration is present at all
    ///
    /// When this returns false the orchestrator skips the advisor entirely
    /// rather than calling it and catching `UpstreamUnavailable`.
    fn is_configured(&self) -> bool;

    /// Produce advice and a severity for the raw symptom text
    ///
    /// # Returns
    /// * `Ok(TriageResult)` - Advice with a severity recovered from the model output
    /// * `Err(AdvisorError)` - If the call fails or the output has no valid severity tag
    async fn advise(&self, symptoms: &str) -> Result<TriageResult>;
}
