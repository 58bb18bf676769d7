//! Renderer
//!
//! Turns a content store into browsable output.

pub mod html;
pub mod json;
pub mod toc;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::ContentStore;

pub use html::{escape_html, render_document, render_index};
pub use json::render_json;
pub use toc::render_toc;

/// Output format of `render_store`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderFormat {
    /// One page per document plus index.html, unless a document already
    /// renders there
    #[default]
    Html,
    /// Markdown table of contents (toc.md)
    Toc,
    /// The parsed store as JSON (docs.json)
    Json,
}

/// Render the store into `out_dir`, returning the files written
pub fn render_store(store: &ContentStore, format: RenderFormat, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();
    match format {
        RenderFormat::Html => {
            for doc in store.documents() {
                let path = out_dir.join(html::html_path(&doc.name));
                write_file(&path, &render_document(doc))?;
                written.push(path);
            }
            // A document rendered to index.html is the landing page
            let index = out_dir.join("index.html");
            if written.contains(&index) {
                log::debug!("Keeping the rendered document as index.html");
            } else {
                write_file(&index, &render_index(store))?;
                written.push(index);
            }
        }
        RenderFormat::Toc => {
            let path = out_dir.join("toc.md");
            write_file(&path, &render_toc(store))?;
            written.push(path);
        }
        RenderFormat::Json => {
            let path = out_dir.join("docs.json");
            let json = render_json(store).context("Failed to serialize documents")?;
            write_file(&path, &json)?;
            written.push(path);
        }
    }

    log::info!("Rendered {} files into {}", written.len(), out_dir.display());
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
