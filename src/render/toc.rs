//! Markdown table of contents.

use std::fmt::Write as _;

use crate::core::ContentStore;

/// Nested markdown list of documents and their sections
///
/// The document title links to the page itself; the level-1 heading that
/// supplied the title is not repeated below it.
pub fn render_toc(store: &ContentStore) -> String {
    let mut out = String::from("# Table of contents\n\n");

    for doc in store.documents() {
        let document = doc.document();
        let title = document.non_empty_title().unwrap_or(doc.name.as_str());
        let _ = writeln!(out, "- [{}]({})", escape_label(title), doc.name);

        let mut title_seen = false;
        for section in document.headed_sections() {
            if section.level == 1 && !title_seen {
                title_seen = true;
                continue;
            }
            let depth = usize::from(section.level.saturating_sub(1)).max(1);
            let _ = writeln!(
                out,
                "{}- [{}]({}#{})",
                "  ".repeat(depth),
                escape_label(&section.heading),
                doc.name,
                section.anchor
            );
        }
    }

    out
}

fn escape_label(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
