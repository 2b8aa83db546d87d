//! CLI interface for the triage engine
//!
//! Defines the commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Symptom triage assistant
///
/// Describes how urgent a set of symptoms sounds and what to do next. Uses
/// an external language model when a key is configured and a built-in
/// keyword classifier otherwise.
#[derive(Parser, Debug)]
#[command(name = "triage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Triage a symptom description and print the advice
    Diagnose {
        /// Symptom description, e.g. "headache and a runny nose"
        text: String,
    },

    /// Show logged conversations, oldest first
    History {
        /// Only show the most recent N conversations
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Show model configuration and conversation log backend
    Status,

    /// Manage the model API key
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

/// API key management actions
#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store the API key in the OS keychain
    Set {
        /// API key value
        value: String,
    },

    /// Remove the API key from the OS keychain
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["triage", "status"]);
        assert!(matches!(cli.command, Command::Status));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "triage",
            "--json",
            "--log",
            "debug",
            "--config",
            "/tmp/triage.toml",
            "status",
        ]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/triage.toml")));
    }

    #[test]
    fn test_diagnose_command() {
        let cli = Cli::parse_from(["triage", "diagnose", "sore throat and a cough"]);
        if let Command::Diagnose { text } = cli.command {
            assert_eq!(text, "sore throat and a cough");
        } else {
            panic!("Expected Diagnose command");
        }
    }

    #[test]
    fn test_history_command() {
        let cli = Cli::parse_from(["triage", "history", "--limit", "20"]);
        if let Command::History { limit } = cli.command {
            assert_eq!(limit, Some(20));
        } else {
            panic!("Expected History command");
        }

        let cli = Cli::parse_from(["triage", "history"]);
        assert!(matches!(cli.command, Command::History { limit: None }));
    }

    #[test]
    fn test_secret_set() {
        let cli = Cli::parse_from(["triage", "secret", "set", "sk-test"]);
        if let Command::Secret { action } = cli.command {
            if let SecretAction::Set { value } = action {
                assert_eq!(value, "sk-test");
            } else {
                panic!("Expected SecretAction::Set");
            }
        } else {
            panic!("Expected Secret command");
        }
    }

    #[test]
    fn test_diagnose_requires_text() {
        assert!(Cli::try_parse_from(["triage", "diagnose"]).is_err());
    }
}
