//! calbridge CLI entry point.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;

use calbridge_client::cli::{Cli, Command, ConfigAction};
use calbridge_client::commands;
use calbridge_client::config::ClientConfig;
use calbridge_client::error::{ClientError, ClientResult};
use calbridge_client::session::{Session, SessionOptions};
use calbridge_core::OutputFormat;
use calbridge_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = load_config(cli.config.as_ref())?.with_backend_url(cli.backend_url.clone());
    let format = cli.output_format();

    init_tracing(tracing_config(cli.debug || config.debug, format))?;

    match cli.command {
        None | Some(Command::Session) => {
            let options = SessionOptions {
                format,
                open_browser: !cli.no_browser,
                prompt: std::io::stdin().is_terminal(),
            };
            let mut session = Session::from_config(&config, options, std::io::stdout())?;
            session.run(BufReader::new(tokio::io::stdin())).await
        }
        Some(Command::Login) => commands::login::login(&config, !cli.no_browser, format).await,
        Some(Command::Range { args }) => commands::range::range(&config, &args, format),
        Some(Command::Health) => commands::health::health(&config, format).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}

fn load_config(path: Option<&PathBuf>) -> ClientResult<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load_from(path).map_err(ClientError::Config),
        None => ClientConfig::load().map_err(ClientError::Config),
    }
}

fn tracing_config(debug: bool, format: OutputFormat) -> TracingConfig {
    let config = if debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    match format {
        OutputFormat::Json => config.with_format(TracingOutputFormat::Json),
        OutputFormat::Tty => config,
    }
}
