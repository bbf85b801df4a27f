mod cli;
mod config;
mod error;
mod files;
mod models;
mod store;

use clap::Parser;
use cli::{App, Cli, TerminalConsole};
use colored::*;
use config::AppConfig;
use error::Result;
use store::RegistryStore;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "env-vars-menu.log";

fn main() -> Result<()> {
    let _cli = Cli::parse();

    // Nothing is read or written before the platform is confirmed.
    let mut console = TerminalConsole::new();
    if !cli::ensure_supported_platform(std::env::consts::OS, &mut console) {
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    let _guard = init_logging(&config);

    info!("Starting environment variable manager (data root: {})", config.root.display());

    let mut app = App::new(RegistryStore::new(), console, config);
    if let Err(e) = app.run() {
        error!("Interactive session ended with an error: {:?}", e);
        println!("{} {}", "Error:".red(), e.to_string().red());
        return Err(e);
    }

    info!("Exited normally");
    Ok(())
}

/// Initialize logging
///
/// Logs go to stderr unless a log directory is configured, in which case they
/// are written to a daily-rolling file. The returned guard flushes the file
/// writer on drop and must be held for the life of the program.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env();

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if config.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
            Some(guard)
        },
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if config.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
            None
        },
    }
}
