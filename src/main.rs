use anyhow::Result;
use clap::Parser;

use parko_client::cli;
use parko_client::config::{CliArgs, Config, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    init_logging(&config);
    tracing::debug!(api = %config.api_base_url, "Parko client starting");

    let session = cli::build_session(&config)?;
    cli::run(&session, args.command).await
}

/// Initialize logging with the configured level; RUST_LOG takes precedence
fn init_logging(config: &Config) {
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_file(true).with_line_number(true).init(),
    }
}
