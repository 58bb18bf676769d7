use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, RenderArgs};
use crate::core::ContentStore;
use crate::render::render_store;

/// `docs-ls render`
pub fn render(args: RenderArgs, config: &Config) -> Result<bool> {
    let store = ContentStore::load(&config.doc_paths(&args.paths))?;
    let written = render_store(&store, args.format, &args.out)?;

    println!(
        "{} {} documents into {} ({} files)",
        "Rendered".green().bold(),
        store.len(),
        args.out.display(),
        written.len()
    );
    Ok(true)
}
