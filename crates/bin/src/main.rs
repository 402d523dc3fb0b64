use clap::Parser;
use objectbase::constants::DEFAULT_LOG_DIRECTIVE;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);
    tracing::debug!("Backend: {}", backend::backend_label(&cli.backend_config));

    let config = &cli.backend_config;
    let result = match &cli.command {
        Commands::List(args) => commands::read::list(config, args, format).await,
        Commands::Get(args) => commands::read::get(config, args, format).await,
        Commands::Find(args) => commands::read::find(config, args, format).await,
        Commands::Insert(args) => commands::write::insert(config, args, format).await,
        Commands::Set(args) => commands::write::set(config, args, format).await,
        Commands::Delete(args) => commands::write::delete(config, args, format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
