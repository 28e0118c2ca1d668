//! # Flow Configuration Validator
//!
//! Command-line tool that loads the layered flow configuration for an
//! environment, validates it, and prints the effective settings.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use telemetry_flow::config::ConfigManager;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "flow-config-validator")]
#[command(about = "Validate telemetry flow configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, env = "TELEMETRY_FLOW_ENV", default_value = "development")]
    environment: String,

    /// Configuration directory (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    match run(&cli) {
        Ok(()) => {
            info!("Configuration validation completed successfully");
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    let config = manager.config();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
        }
        OutputFormat::Table => {
            println!("🔧 Telemetry flow configuration");
            println!("Environment:      {}", manager.environment());
            println!("Config directory: {}", manager.config_directory().display());
            println!();
            println!("health.throttle_interval_ms   {}", config.health.throttle_interval_ms);
            println!("health.staleness_ceiling_ms   {}", config.health.staleness_ceiling_ms);
            println!("metrics.window_interval_ms    {}", config.metrics.window_interval_ms);
            println!("metrics.buffer_max_size       {}", config.metrics.buffer_max_size);
            println!("alerts.debounce_interval_ms   {}", config.alerts.debounce_interval_ms);
            println!("alerts.cache_max_size         {}", config.alerts.cache_max_size);
            println!("bus.channel_capacity          {}", config.bus.channel_capacity);
            println!();
            println!("✅ Configuration is valid");
        }
    }

    Ok(())
}
