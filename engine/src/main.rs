// Symptom triage CLI
// Main entry point for the `triage` binary

use clap::Parser;
use triage_engine::cli::{Cli, Command, SecretAction};
use triage_engine::config::Config;
use triage_engine::handlers::{
    handle_diagnose, handle_history, handle_secret_delete, handle_secret_set, handle_status,
    OutputFormat,
};
use triage_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG still beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::debug!(
        "Triage v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Diagnose { text } => {
            tracing::debug!("Diagnosing: {}", text);
            handle_diagnose(text, &config, format).await
        }

        Command::History { limit } => handle_history(limit, &config, format).await,

        Command::Status => handle_status(&config, format).await,

        Command::Secret { action } => match action {
            SecretAction::Set { value } => handle_secret_set(value, format).await,
            SecretAction::Delete => handle_secret_delete(format).await,
        },
    }
}
