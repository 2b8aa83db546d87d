//! Command handlers for CLI operations
//!
//! - diagnose: triage one symptom description
//! - history: show logged conversations
//! - status: show model configuration and log backend
//! - secret set/delete: manage the model API key
//!
//! Each handler renders to a `String` first so output can be tested without
//! capturing stdout.

use anyhow::{Context, Result};
use sdk::types::{ConversationEntry, TriageRequest};
use serde_json::json;

use crate::config::Config;
use crate::secrets::{SecretManager, OPENAI_API_KEY, OPENAI_API_KEY_ENV, SERVICE_NAME};
use crate::triage::{TriageEngine, TriageOutcome};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Triage `text` and print the advice
///
/// A conversation log failure is reported as a warning; the advice is still
/// printed and the command succeeds.
pub async fn handle_diagnose(text: String, config: &Config, format: OutputFormat) -> Result<()> {
    let request = TriageRequest::new(text)?;

    let secrets = SecretManager::new(SERVICE_NAME);
    let engine = TriageEngine::from_config(config, &secrets)
        .await
        .context("Failed to initialize triage engine")?;

    let outcome = engine.triage(&request).await;
    engine
        .shutdown()
        .await
        .context("Failed to close conversation log")?;

    if let Some(e) = &outcome.log_error {
        eprintln!("Warning: conversation was not recorded: {}", e);
    }

    println!("{}", render_outcome(&outcome, format)?);
    Ok(())
}

/// Print logged conversations, optionally only the most recent `limit`
pub async fn handle_history(limit: Option<usize>, config: &Config, format: OutputFormat) -> Result<()> {
    let log = crate::history::open_log(config)
        .await
        .context("Failed to open conversation log")?;

    let entries = log
        .read_all()
        .await
        .context("Failed to read conversation history")?;
    log.close()
        .await
        .context("Failed to close conversation log")?;

    println!("{}", render_history(&entries, limit, format)?);
    Ok(())
}

/// Print whether the model is configured and where conversations are logged
pub async fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let secrets = SecretManager::new(SERVICE_NAME);
    let status = StatusReport::collect(config, &secrets);
    println!("{}", status.render(format)?);
    Ok(())
}

/// Store the model API key in the OS keychain
pub async fn handle_secret_set(value: String, format: OutputFormat) -> Result<()> {
    let secrets = SecretManager::new(SERVICE_NAME);
    secrets
        .set_secret(OPENAI_API_KEY, &value)
        .context("Failed to store API key")?;

    match format {
        OutputFormat::Text => {
            println!("✓ API key stored in keychain (service '{}')", SERVICE_NAME);
            if std::env::var(OPENAI_API_KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
                println!(
                    "  Note: {} is set and takes precedence over the keychain",
                    OPENAI_API_KEY_ENV
                );
            }
        }
        OutputFormat::Json => {
            let output = json!({ "stored": true, "service": SERVICE_NAME });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Remove the model API key from the OS keychain
pub async fn handle_secret_delete(format: OutputFormat) -> Result<()> {
    let secrets = SecretManager::new(SERVICE_NAME);
    secrets
        .delete_secret(OPENAI_API_KEY)
        .context("Failed to delete API key")?;

    match format {
        OutputFormat::Text => println!("✓ API key removed from keychain"),
        OutputFormat::Json => {
            let output = json!({ "deleted": true, "service": SERVICE_NAME });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Render a triage outcome for display
pub fn render_outcome(outcome: &TriageOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!(
                "Severity: {}\n\n",
                outcome.result.severity.as_str().to_uppercase()
            ));
            out.push_str(&outcome.result.advice);
            out.push_str(&format!("\n\n(source: {})", outcome.path));
            Ok(out)
        }
        OutputFormat::Json => {
            let output = json!({
                "advice": outcome.result.advice,
                "severity": outcome.result.severity,
                "timestamp": outcome.timestamp,
                "source": outcome.path,
                "recorded": outcome.log_error.is_none(),
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

/// Render logged conversations, keeping only the newest `limit` entries
pub fn render_history(
    entries: &[ConversationEntry],
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<String> {
    let shown = match limit {
        Some(limit) if limit < entries.len() => &entries[entries.len() - limit..],
        _ => entries,
    };

    match format {
        OutputFormat::Text => {
            if shown.is_empty() {
                return Ok("No conversations in history".to_string());
            }

            let mut out = format!(
                "Conversation History ({} of {}):\n",
                shown.len(),
                entries.len()
            );
            for entry in shown {
                out.push('\n');
                out.push_str(&format!(
                    "[{}] {}\n",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.severity.as_str().to_uppercase()
                ));
                out.push_str(&format!("  You: {}\n", entry.user));
                let first_line = entry.response.lines().next().unwrap_or_default();
                out.push_str(&format!("  Advice: {}\n", first_line));
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => {
            let output = json!({
                "conversations": shown,
                "count": shown.len(),
                "total": entries.len(),
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

/// Snapshot printed by `triage status`
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub model_enabled: bool,
    pub model_configured: bool,
    pub model: String,
    pub base_url: String,
    pub log_backend: &'static str,
    pub log_location: String,
}

impl StatusReport {
    /// Inspect configuration and credentials without contacting the model
    pub fn collect(config: &Config, secrets: &SecretManager) -> Self {
        let model_configured = config.llm.enabled && secrets.openai_api_key().is_some();
        let log_location = match config.history.backend {
            crate::config::HistoryBackend::Memory => "in memory".to_string(),
            _ => config.history_path().display().to_string(),
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            model_enabled: config.llm.enabled,
            model_configured,
            model: config.llm.openai.model.clone(),
            base_url: config.llm.openai.base_url.clone(),
            log_backend: config.history.backend.as_str(),
            log_location,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => {
                let model_state = if !self.model_enabled {
                    "disabled".to_string()
                } else if self.model_configured {
                    format!("configured ({} via {})", self.model, self.base_url)
                } else {
                    "no API key, using keyword classifier".to_string()
                };

                Ok(format!(
                    "Triage v{}\n  Model:            {}\n  Conversation log: {} ({})",
                    self.version, model_state, self.log_backend, self.log_location
                ))
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
