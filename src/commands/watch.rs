use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::commands::check_store;
use crate::config::{Config, WatchArgs};
use crate::core::ContentStore;
use crate::profile::ProfilePriority;
use crate::watch::{DocumentWatcher, WatchBatch};

/// `docs-ls watch`: check once, then again after every batch of changes
pub async fn watch(args: WatchArgs, config: &Config) -> Result<bool> {
    let doc_paths = config.doc_paths(&args.paths);

    // Workspace profiles are watched too so toolchain edits take effect
    let mut watched: Vec<PathBuf> = doc_paths.clone();
    watched.extend(
        config
            .profile_dirs
            .iter()
            .filter(|(_, priority)| *priority == ProfilePriority::Workspace)
            .map(|(dir, _)| dir.clone()),
    );
    let mut watcher = DocumentWatcher::new(&watched)?;

    run_check(&doc_paths, config, args.validate_snippets).await;

    while let Some(batch) = watcher.next_batch().await {
        match batch {
            WatchBatch::Changed(paths) => {
                for path in &paths {
                    println!("{} {}", "changed".cyan(), path.display());
                }
                run_check(&doc_paths, config, args.validate_snippets).await;
            }
            WatchBatch::Error(e) => log::warn!("File watcher error: {}", e),
        }
    }

    Ok(true)
}

async fn run_check(paths: &[PathBuf], config: &Config, validate_snippets: bool) {
    let profiles = config.build_registry();
    match ContentStore::load(paths) {
        Ok(store) => {
            let report = check_store(&store, &profiles, config, validate_snippets).await;
            print!("{}", report.render_text(false));
        }
        Err(e) => log::error!("{:#}", e),
    }
}
