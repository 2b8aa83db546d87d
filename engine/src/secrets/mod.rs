pub mod string;

pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::sync::OnceLock;

/// Keychain service name used by the CLI and the API server
pub const SERVICE_NAME: &str = "triage";

/// Keychain key under which the model credential is stored
pub const OPENAI_API_KEY: &str = "openai_api_key";

/// Environment variable checked before the keychain
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// SecretManager resolves credentials without ever prompting.
///
/// Lookup order:
/// 1. Environment variable (non-blank)
/// 2. OS keychain (macOS Keychain, Windows Credential Manager, Linux Secret Service)
///
/// A credential that cannot be found is not an error: the caller treats it as
/// "external model not configured" and takes the fallback path.
///
/// The SecretManager also scrubs credential-shaped substrings out of text
/// before it reaches the logs.
pub struct SecretManager {
    service_name: String,
}

/// Regex patterns for detecting common secret formats.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [r"sk-[a-zA-Z0-9\-_]{20,}", r"Bearer\s+[^\s]{20,}"]
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

impl SecretManager {
    /// Creates a new SecretManager with the given keychain service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Resolve a credential from `env_var`, then from the keychain entry `key`.
    ///
    /// Keychain failures (no secret service on a headless host, locked
    /// keychain) are logged at debug and reported as `None`.
    pub fn resolve(&self, key: &str, env_var: &str) -> Option<SecretString> {
        if let Ok(value) = std::env::var(env_var) {
            let secret = SecretString::new(value);
            if !secret.is_blank() {
                tracing::debug!("Resolved secret '{}' from environment", key);
                return Some(secret);
            }
        }

        match self.keychain_secret(key) {
            Ok(Some(secret)) if !secret.is_blank() => {
                tracing::debug!("Resolved secret '{}' from keychain", key);
                Some(secret)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Keychain lookup for '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Resolve the model credential using the standard key and variable.
    pub fn openai_api_key(&self) -> Option<SecretString> {
        self.resolve(OPENAI_API_KEY, OPENAI_API_KEY_ENV)
    }

    /// Reads a secret from the OS keychain; `Ok(None)` when absent.
    fn keychain_secret(&self, key: &str) -> Result<Option<SecretString>, EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => Ok(Some(SecretString::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if keychain access fails or the
    /// value is blank.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        if value.trim().is_empty() {
            return Err(EngineError::KeyringError(
                "Secret cannot be empty".to_string(),
            ));
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Deletes a secret from the OS keychain.
    pub fn delete_secret(&self, key: &str) -> Result<(), EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.delete_password().map_err(|e| {
            EngineError::KeyringError(format!("Failed to delete secret '{}': {}", key, e))
        })?;

        tracing::info!("Deleted secret '{}' from keychain", key);
        Ok(())
    }

    /// Scrubs credential-shaped substrings from text, replacing them with [REDACTED].
    ///
    /// # Examples
    /// ```
    /// use triage_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("Incorrect API key provided: sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "Incorrect API key provided: [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let mut result = text.to_string();

        for pattern in get_secret_patterns() {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }

        result
    }
}
