use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{ExtractArgs, OutputFormat};
use crate::snippet::{extract_snippets, SnippetLabel};

/// `docs-ls extract`
pub fn extract(args: ExtractArgs) -> Result<bool> {
    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    let snippets = match extract_snippets(&text) {
        Ok(snippets) => snippets,
        Err(e) => {
            eprintln!("{} {}: {}", "error".red().bold(), args.path.display(), e);
            return Ok(false);
        }
    };

    let wanted = args.label.as_deref().map(SnippetLabel::from_word);
    let selected: Vec<_> = snippets
        .into_iter()
        .filter(|s| wanted.as_ref().is_none_or(|label| &s.label == label))
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
        OutputFormat::Text => {
            for snippet in &selected {
                println!(
                    "{}:{} [{}] {}",
                    args.path.display(),
                    snippet.line,
                    snippet.label.to_string().cyan(),
                    snippet.language
                );
                println!("{}", snippet.text);
                println!();
            }
            log::info!("{} snippets extracted", selected.len());
        }
    }

    Ok(true)
}
