//! Regula CLI - Command-line interface for the vehicle-lookup resolver.

use clap::Parser;
use regula_cli::commands;
use regula_cli::{Cli, CliError, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let color_enabled = !cli.no_color;

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Create formatter
    let formatter = Formatter::new(format, color_enabled && config.settings.color);

    if let Err(e) = run(cli.command, &config, &formatter).await {
        match &e {
            CliError::Resolve(resolve) => eprintln!("{}", formatter.format_resolve_error(resolve)),
            _ => eprintln!("{}", formatter.error(&e.to_string())),
        }
        std::process::exit(1);
    }
}

async fn run(command: Command, config: &Config, formatter: &Formatter) -> regula_cli::Result<()> {
    match command {
        Command::Resolve(args) => commands::execute_resolve(args, config, formatter).await,
        Command::History(args) => commands::execute_history(args, config, formatter),
        Command::Infer(args) => commands::execute_infer(args, formatter),
    }
}
