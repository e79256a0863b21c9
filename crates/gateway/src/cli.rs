//! Command-line interface.

use clap::{Parser, Subcommand};

/// scenariod — a context-aware scenario matching engine for home automation.
#[derive(Debug, Parser)]
#[command(name = "scenariod", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Validate rules.json and config.json without starting the server.
    Validate,
    /// Run a single trigger through the matcher and print the result,
    /// without starting the HTTP server or dispatching any actions.
    Simulate {
        /// Room identifier (resolved through configured aliases).
        room: String,
        /// Comma-separated conditional flags to force active.
        #[arg(long, value_delimiter = ',')]
        flags: Vec<String>,
        /// Interaction type (e.g. single_press, double_press, motion).
        #[arg(long, default_value = "")]
        interaction: String,
    },
    /// Print version information.
    Version,
}

/// Load the gateway's own startup configuration from `$SCENARIOD_CONFIG`
/// (or `config.toml` by default), applying environment variable overrides.
pub fn load_server_config() -> anyhow::Result<(crate::config::ServerConfig, String)> {
    let path = std::env::var("SCENARIOD_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = crate::config::ServerConfig::load(std::path::Path::new(&path))?;
    Ok((config, path))
}
