//! Watchstore CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use watchstore::cli::args::ConfigAction;
use watchstore::cli::{Cli, Commands};
use watchstore::config::{Config, ConfigManager};
use watchstore::error::{WatchStoreError, WatchStoreResult};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> WatchStoreResult<()> {
    let cli = Cli::parse();

    let cwd =
        std::env::current_dir().map_err(|e| WatchStoreError::io("getting current directory", e))?;

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => match ConfigManager::find_local_config(&cwd) {
            Some(found) => ConfigManager::with_path(found),
            None => ConfigManager::in_dir(&cwd),
        },
    };

    // config init/path work without an existing file
    let creating = matches!(
        &cli.command,
        Commands::Config(args) if matches!(args.action, Some(ConfigAction::Init { .. } | ConfigAction::Path))
    );
    let config = if cli.config.is_some() && !manager.path().exists() && !creating {
        return Err(WatchStoreError::ConfigNotFound(manager.path().to_path_buf()));
    } else if creating {
        Config::default()
    } else {
        manager.load().await?
    };

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", manager.path().display());

    let root = project_root(&manager, &cwd);

    match cli.command {
        Commands::Get(args) => watchstore::cli::commands::get(args, &config, &root).await,
        Commands::Watch(args) => watchstore::cli::commands::watch(args, &config, &root).await,
        Commands::Config(args) => watchstore::cli::commands::config(args, &config, &manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_logging(verbose: u8, format: &str) {
    let default = match verbose {
        0 => "watchstore=warn",
        1 => "watchstore=info",
        _ => "watchstore=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

/// Absolute directory the config is anchored to
fn project_root(manager: &ConfigManager, cwd: &std::path::Path) -> PathBuf {
    let root = manager.root();
    let root = if root.is_absolute() { root } else { cwd.join(root) };
    std::fs::canonicalize(&root).unwrap_or(root)
}
