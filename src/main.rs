use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod cli;
mod commands;
mod config;
mod error;
mod models;
mod presence;
mod process;
mod store;
mod utils;

use cli::{Cli, Commands};
use config::LauncherConfig;

/// Log to stderr, and to a daily file when `log_dir` is configured. The
/// returned guard flushes the file writer on drop.
fn init_tracing(config: &LauncherConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "bloxlaunch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LauncherConfig::load(cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    let _log_guard = init_tracing(&config)?;

    match cli.command {
        Commands::Launch(args) => commands::launch::execute(args, config).await,
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Flags(args) => commands::flags::execute(args, config).await,
        Commands::Settings(args) => commands::settings::execute(args, config).await,
        Commands::Presets(args) => commands::presets::execute(args, config).await,
        Commands::Version => commands::version::execute().await,
        Commands::Open(args) => commands::open::execute(args).await,
    }
}
