//! Watch command - print reloaded batches until interrupted

use crate::cli::args::WatchArgs;
use crate::config::Config;
use crate::error::{WatchStoreError, WatchStoreResult};
use crate::store::FileEntry;
use crate::watch_store::{WatchStore, WatchStoreOptions};
use crate::watcher::FsWatcher;
use chrono::Local;
use console::{style, Emoji};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the watch command
pub async fn execute(args: WatchArgs, config: &Config, root: &Path) -> WatchStoreResult<()> {
    let mut options = WatchStoreOptions::from_config(config, root)?;
    if options.watcher.is_none() {
        debug!("No [watch] section, using the default debounce");
        options.watcher = Some(Arc::new(FsWatcher::default()));
    }
    let store = WatchStore::new(options);

    for path in &args.preload {
        match store.get_file(super::from_cwd(path)).await? {
            Some(entry) => println!("{}{}", CHECK, entry.relative_path),
            None => println!(
                "{}{} {}",
                WARN,
                path.display(),
                style("(missing or skipped)").dim()
            ),
        }
    }

    store.on_change(Arc::new(print_batch));
    store.start()?;

    println!(
        "{} {} files, press Ctrl-C to stop",
        style("Watching").bold().cyan(),
        store.get_watched().len()
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| WatchStoreError::io("waiting for Ctrl-C", e))?;

    store.stop();
    println!("{}", style("Stopped").dim());
    Ok(())
}

fn print_batch(entries: &[FileEntry]) {
    println!(
        "{} {}",
        style(Local::now().format("%H:%M:%S")).dim(),
        style(format!("{} reloaded", entries.len())).bold()
    );
    for entry in entries {
        println!("  {}{} {}", CHECK, entry.relative_path, style(&entry.content_type).dim());
    }
}
