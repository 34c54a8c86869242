use std::process::ExitCode;

use aws_connector::cli::{self, Cli};
use aws_connector::infrastructure::init_logging;
use aws_connector::AppConfig;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let (config, load_error) = AppConfig::load_or_default();
    init_logging(&config.logging);

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Invalid configuration, falling back to defaults");
    }

    cli::commands::run(cli.command, &config).await
}
