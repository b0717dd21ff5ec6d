//! CLI command definitions for the `parley` binary.
//!
//! `serve` runs the HTTP API; the remaining commands are operator views over
//! the same chat service and store.

pub mod conversation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Streaming chat backend with durable conversation transcripts.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "PARLEY_CONFIG", default_value = "parley.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Port to listen on (overrides server.port and PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides server.host).
        #[arg(long)]
        host: Option<String>,
    },

    /// List a user's conversations with their message counts.
    #[command(alias = "ls")]
    Conversations {
        /// User whose partition to scan.
        user_id: String,
    },

    /// Print the transcript of one conversation.
    History {
        user_id: String,
        session_id: String,
    },

    /// Delete a conversation transcript.
    #[command(alias = "rm")]
    Delete {
        user_id: String,
        session_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from(["parley", "serve", "--port", "9000", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: Some(9000),
                host: None
            }
        ));
    }

    #[test]
    fn test_cli_parses_history_with_global_flags() {
        let cli = Cli::try_parse_from([
            "parley",
            "history",
            "alice",
            "s-1",
            "--json",
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(
            cli.command,
            Commands::History { ref user_id, ref session_id } if user_id == "alice" && session_id == "s-1"
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["parley"]).is_err());
    }
}
