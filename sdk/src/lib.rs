//! Triage SDK
//!
//! Shared library providing the domain types and error handling used by the
//! triage engine and the HTTP surface.

/// Error types and handling
pub mod errors;

/// Triage request/result and conversation types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, EngineErrorExt};
pub use types::{ConversationEntry, Severity, TriageRequest, TriageResult};
