//! Get command - load one file through the store

use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{WatchStoreError, WatchStoreResult};
use crate::store::{FileData, FileEntry};
use crate::watch_store::{WatchStore, WatchStoreOptions};
use console::style;
use std::io::Write;
use std::path::Path;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config, root: &Path) -> WatchStoreResult<()> {
    let mut options = WatchStoreOptions::from_config(config, root)?;
    // one-shot load, nothing to watch
    options.watcher = None;
    let store = WatchStore::new(options);

    let path = super::from_cwd(&args.path);
    let entry = store
        .get_file(&path)
        .await?
        .ok_or_else(|| WatchStoreError::Unavailable(store.resolve_base(&path)))?;

    if args.info {
        print_info(&entry);
        return Ok(());
    }

    match entry.data() {
        Some(FileData::Text(text)) => print!("{}", text),
        Some(FileData::Binary(bytes)) => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|()| stdout.flush())
                .map_err(|e| WatchStoreError::io("writing to stdout", e))?;
        }
        None => {}
    }

    Ok(())
}

fn print_info(entry: &FileEntry) {
    println!("{}", style(&entry.relative_path).bold().cyan());
    println!("  {:<14} {}", style("Path:").bold(), entry.path.display());
    println!("  {:<14} {}", style("Content type:").bold(), entry.content_type);
    println!(
        "  {:<14} {} bytes",
        style("Size:").bold(),
        entry.raw_data.as_ref().map(FileData::len).unwrap_or(0)
    );
    if let Some(out) = &entry.transpiled_data {
        println!("  {:<14} {} bytes", style("Transformed:").bold(), out.len());
    }
    if !entry.dependencies.is_empty() {
        println!("  {}", style("Dependencies:").bold());
        for dep in &entry.dependencies {
            println!("    {}", dep.display());
        }
    }
}
