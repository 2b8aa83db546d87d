//! Triage orchestration
//!
//! [`TriageEngine`] turns a validated [`TriageRequest`] into a
//! [`TriageResult`]. It consults the external model at most once, bounded by
//! a timeout, and falls back to the deterministic [`FallbackClassifier`] on
//! any upstream failure or when no model is configured. It then appends the
//! exchange to the conversation log.
//!
//! The decision is exposed as [`TriagePath`] so callers and tests can see
//! which branch produced the answer.

use crate::config::Config;
use crate::history::{self, ConversationLog};
use crate::llm::{openai::OpenAIAdvisor, Advisor, AdvisorError};
use crate::secrets::SecretManager;
use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use sdk::types::{ConversationEntry, TriageRequest, TriageResult};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub mod classifier;

pub use classifier::FallbackClassifier;

/// Appended to every piece of advice, whichever path produced it
pub const DISCLAIMER: &str = "⚠️ Disclaimer: This advice is for informational purposes only and does not replace professional medical consultation. Please consult a qualified healthcare provider for proper diagnosis and treatment.";

/// Append the standard disclaimer unless the text already ends with it
pub fn ensure_disclaimer(advice: &str) -> String {
    let advice = advice.trim_end();
    if advice.ends_with(DISCLAIMER) {
        advice.to_string()
    } else {
        format!("{}\n\n{}", advice, DISCLAIMER)
    }
}

/// Default advisor budget when none is configured
const DEFAULT_ADVISOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a request ended up on the fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No advisor or no credential; the normal offline path
    Unconfigured,
    /// Advisor reported it could not be reached or used
    UpstreamUnavailable,
    /// Advisor call failed, timed out, or returned unusable content
    UpstreamError,
}

/// Which branch produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "path", content = "reason", rename_all = "snake_case")]
pub enum TriagePath {
    Model,
    Fallback(FallbackReason),
}

impl TriagePath {
    pub fn is_fallback(&self) -> bool {
        matches!(self, TriagePath::Fallback(_))
    }
}

impl fmt::Display for TriagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriagePath::Model => write!(f, "model"),
            TriagePath::Fallback(FallbackReason::Unconfigured) => write!(f, "fallback (unconfigured)"),
            TriagePath::Fallback(FallbackReason::UpstreamUnavailable) => {
                write!(f, "fallback (upstream unavailable)")
            }
            TriagePath::Fallback(FallbackReason::UpstreamError) => {
                write!(f, "fallback (upstream error)")
            }
        }
    }
}

/// Everything a caller learns from one triage call
#[derive(Debug)]
pub struct TriageOutcome {
    /// Advice and severity; always present
    pub result: TriageResult,

    /// Branch that produced `result`
    pub path: TriagePath,

    /// Timestamp recorded on the conversation entry
    pub timestamp: DateTime<Utc>,

    /// Set when the conversation log append failed. The result above is
    /// still valid and should be returned to the user.
    pub log_error: Option<EngineError>,
}

/// The triage decision engine
pub struct TriageEngine {
    advisor: Option<Arc<dyn Advisor>>,
    classifier: FallbackClassifier,
    log: Arc<dyn ConversationLog>,
    advisor_timeout: Duration,
    // Held while stamping and appending so log order matches time order
    append_lock: Mutex<()>,
}

impl TriageEngine {
    /// Create an engine that only uses the fallback classifier
    pub fn new(log: Arc<dyn ConversationLog>) -> Self {
        Self {
            advisor: None,
            classifier: FallbackClassifier::new(),
            log,
            advisor_timeout: DEFAULT_ADVISOR_TIMEOUT,
            append_lock: Mutex::new(()),
        }
    }

    /// Attach a model advisor
    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Bound each advisor call
    pub fn with_advisor_timeout(mut self, timeout: Duration) -> Self {
        self.advisor_timeout = timeout;
        self
    }

    /// Build the engine described by `config`
    ///
    /// Opens the configured conversation log and, when the model is enabled,
    /// resolves the credential through `secrets`. A missing credential is
    /// not an error; the engine then runs fallback-only.
    pub async fn from_config(config: &Config, secrets: &SecretManager) -> Result<Self, EngineError> {
        let log = history::open_log(config).await?;
        let mut engine = Self::new(log).with_advisor_timeout(config.llm.timeout());

        if config.llm.enabled {
            let advisor = OpenAIAdvisor::new(
                config.llm.openai.clone(),
                secrets.openai_api_key(),
                config.llm.timeout(),
            )?;
            if advisor.is_configured() {
                tracing::info!("Model advisor configured ({})", config.llm.openai.model);
            } else {
                tracing::info!("No model credential found, using fallback classifier only");
            }
            engine = engine.with_advisor(Arc::new(advisor));
        } else {
            tracing::info!("Model advisor disabled in configuration");
        }

        Ok(engine)
    }

    /// True when a request would be sent to the external model
    pub fn model_configured(&self) -> bool {
        self.advisor
            .as_ref()
            .is_some_and(|advisor| advisor.is_configured())
    }

    /// Conversation log backing this engine
    pub fn log(&self) -> &Arc<dyn ConversationLog> {
        &self.log
    }

    /// Decide the result without touching the conversation log
    pub async fn decide(&self, request: &TriageRequest) -> (TriageResult, TriagePath) {
        let symptoms = request.symptom_text();

        let advisor = match &self.advisor {
            Some(advisor) if advisor.is_configured() => advisor,
            _ => {
                tracing::debug!("No model configured, taking fallback path");
                return (
                    self.classifier.classify(symptoms),
                    TriagePath::Fallback(FallbackReason::Unconfigured),
                );
            }
        };

        tracing::debug!(
            "Consulting advisor {} (timeout: {:?})",
            advisor.name(),
            self.advisor_timeout
        );

        let outcome = tokio::time::timeout(self.advisor_timeout, advisor.advise(symptoms)).await;

        let reason = match outcome {
            Ok(Ok(result)) => {
                tracing::info!("Advisor {} produced {} result", advisor.name(), result.severity);
                return (result, TriagePath::Model);
            }
            Ok(Err(AdvisorError::UpstreamUnavailable(e))) => {
                tracing::info!("Advisor {} unavailable: {}", advisor.name(), e);
                FallbackReason::UpstreamUnavailable
            }
            Ok(Err(AdvisorError::UpstreamError(e))) => {
                tracing::warn!("Advisor {} failed: {}", advisor.name(), e);
                FallbackReason::UpstreamError
            }
            Err(_) => {
                tracing::warn!(
                    "Advisor {} timed out after {:?}",
                    advisor.name(),
                    self.advisor_timeout
                );
                FallbackReason::UpstreamError
            }
        };

        (self.classifier.classify(symptoms), TriagePath::Fallback(reason))
    }

    /// Triage one request and record it
    ///
    /// Never fails. A conversation log failure is reported on
    /// [`TriageOutcome::log_error`] alongside a valid result.
    pub async fn triage(&self, request: &TriageRequest) -> TriageOutcome {
        let (result, path) = self.decide(request).await;

        let (timestamp, appended) = {
            let _guard = self.append_lock.lock().await;
            let timestamp = Utc::now();
            let entry = ConversationEntry::new(request, &result, timestamp);
            (timestamp, self.log.append(entry).await)
        };

        let log_error = match appended {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to record conversation in {} log: {}", self.log.backend(), e);
                Some(e)
            }
        };

        tracing::info!("Triage completed via {} ({})", path, result.severity);

        TriageOutcome {
            result,
            path,
            timestamp,
            log_error,
        }
    }

    /// All recorded exchanges in append order
    pub async fn history(&self) -> Result<Vec<ConversationEntry>, EngineError> {
        self.log.read_all().await
    }

    /// Release the conversation log; call once no more requests will arrive
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        tracing::debug!("Closing {} conversation log", self.log.backend());
        self.log.close().await
    }
}
