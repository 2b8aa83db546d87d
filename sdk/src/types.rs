//! Triage request/result and conversation types

use crate::errors::EngineError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse urgency label attached to every piece of advice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Self-care is appropriate
    Mild,

    /// Professional or emergency care is recommended
    Serious,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Serious => "serious",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = EngineError;

    /// Accepts exactly "mild" or "serious", ignoring ASCII case and
    /// surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("mild") {
            Ok(Severity::Mild)
        } else if trimmed.eq_ignore_ascii_case("serious") {
            Ok(Severity::Serious)
        } else {
            Err(EngineError::Validation(format!(
                "Unknown severity '{}'. Must be one of: mild, serious",
                trimmed
            )))
        }
    }
}

/// A single symptom description submitted for triage
///
/// Can only be built through [`TriageRequest::new`], which rejects empty and
/// whitespace-only text. The engine therefore never sees an empty request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageRequest {
    symptom_text: String,
}

impl TriageRequest {
    /// Validate and wrap caller-supplied symptom text
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Validation` if the text is empty after trimming.
    pub fn new(symptom_text: impl Into<String>) -> Result<Self, EngineError> {
        let symptom_text = symptom_text.into();
        if symptom_text.trim().is_empty() {
            return Err(EngineError::Validation(
                "Symptom text must not be empty".to_string(),
            ));
        }
        Ok(Self { symptom_text })
    }

    /// The symptom text exactly as the caller supplied it
    pub fn symptom_text(&self) -> &str {
        &self.symptom_text
    }
}

/// Advice plus severity produced by either the model or the fallback classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriageResult {
    /// Advice text shown to the user
    pub advice: String,

    /// Severity label
    pub severity: Severity,
}

impl TriageResult {
    /// Create a new triage result
    pub fn new(advice: impl Into<String>, severity: Severity) -> Self {
        Self {
            advice: advice.into(),
            severity,
        }
    }
}

/// One logged triage exchange
///
/// Field names match the persisted `conversations.json` document so existing
/// history files stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationEntry {
    /// Symptom text submitted by the user
    pub user: String,

    /// Advice returned to the user
    pub response: String,

    /// Severity returned to the user
    pub severity: Severity,

    /// When the exchange was recorded (UTC, RFC 3339 on the wire)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accepts RFC 3339 with any offset, or an offset-less ISO-8601 timestamp
/// taken as UTC (older history files were written that way).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

impl ConversationEntry {
    /// Record a triage exchange at the given instant
    pub fn new(request: &TriageRequest, result: &TriageResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            user: request.symptom_text().to_string(),
            response: result.advice.clone(),
            severity: result.severity,
            timestamp,
        }
    }
}
