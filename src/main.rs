use clap::{Parser, Subcommand};
use std::process::ExitCode;

use bigmac::cli::report::failure_line;
use bigmac::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch, upload and announce the snapshot (default)
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Setup => match setup(cli.config_path.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Setup failed");
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Run => match bigmac::run(cli.config_path.as_deref()).await {
            Ok(report) => {
                println!("{}", report.display_as_table());
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                eprintln!("{}", failure_line(&e));
                ExitCode::from(e.exit_code())
            }
        },
    }
}

fn setup(config_path: Option<&str>) -> anyhow::Result<()> {
    use anyhow::Context;

    let path = match config_path {
        Some(path) => std::path::PathBuf::from(path),
        None => bigmac::core::config::AppConfig::default_config_path()?,
    };

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
provider:
  base_url: "https://data.nasdaq.com"
  # api_key: "..."   # or set NASDAQ_DATA_LINK_API_KEY
  database: "ECONOMIST"
  series_prefix: "BIGMAC_"
  snapshot_date: "2021-07-31"

reference:
  location: "https://static.quandl.com/ECONOMIST_Descriptions/economist_country_codes.csv"

storage:
  backend: s3
  bucket: "big-mac-data"
  key: "big_mac.csv"

notification:
  topic_name: "big-mac-topic"
  protocol: "email"
  endpoint: "you@example.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    println!("Created default configuration at {}", path.display());
    Ok(())
}
