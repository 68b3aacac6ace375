use clap::Parser;
use deal_signals::cli::{Cli, Commands};
use deal_signals::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to the bundled example when no file exists
    let config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        toml::from_str(include_str!("../config.toml.example"))?
    };

    // Initialize telemetry
    let _telemetry = deal_signals::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(dry_run = args.dry_run, "Starting signal run");
            let report = args.execute(&config).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(class) = report.error_class {
                std::process::exit(class.exit_code());
            }
        }
        Commands::Ingest(args) => {
            tracing::info!(input = ?args.input, "Ingesting captured listings");
            args.execute(&config).await?;
        }
        Commands::Deals(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
