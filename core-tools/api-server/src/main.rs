// Symptom triage HTTP server
// Entry point for the `triage-server` binary

use anyhow::Context;
use api_server::ApiServer;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use triage_engine::config::Config;
use triage_engine::secrets::{SecretManager, SERVICE_NAME};
use triage_engine::telemetry::init_telemetry_with_level;
use triage_engine::triage::TriageEngine;

/// Serve the triage engine over HTTP
#[derive(Parser, Debug)]
#[command(name = "triage-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_create()?,
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_telemetry_with_level(&config.core.log_level);

    let secrets = SecretManager::new(SERVICE_NAME);
    let engine = TriageEngine::from_config(&config, &secrets)
        .await
        .context("Failed to initialize triage engine")?;

    let server = ApiServer::start(Arc::new(engine), &config.server).await?;
    println!("Triage API listening on http://{}", server.addr());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    server.stop().await;
    Ok(())
}
