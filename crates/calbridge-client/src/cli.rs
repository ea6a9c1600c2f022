//! Command-line interface definition.

use std::path::PathBuf;

use calbridge_core::OutputFormat;
use clap::{Parser, Subcommand};

/// calbridge - Google Calendar events through a session backend
#[derive(Debug, Parser)]
#[command(name = "calbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Backend base URL (overrides `server.backend_url`)
    #[arg(long, env = "CALBRIDGE_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Do not open the browser on login
    #[arg(long)]
    pub no_browser: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the output format based on CLI flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Tty
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard (default)
    Session,

    /// Print the Google sign-in URL and open it in the browser
    Login,

    /// Print a date range: this-week, next-week, this-month, or <from> <to>
    Range {
        #[arg(num_args = 0..=2, value_name = "PRESET|FROM TO")]
        args: Vec<String>,
    },

    /// Check the backend
    Health,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
