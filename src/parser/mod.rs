//! Markdown Parser
//!
//! Turns a guidance page into a `Document` of sections and snippets.
//! Focused solely on structure; lint checks live in `validation`.

pub mod ast;
pub mod lexer;
pub mod links;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use ast::{Document, Section, Snippet};
pub use lexer::{is_indented, list_item, tokenize_line, FenceMarker, Lexer, LineKind, ListKind, Token};
pub use links::{classify_target, scan_links, slugify, Link, LinkTarget};

use crate::snippet::SnippetLabel;

/// Number of lines at the start and end of a document searched for a modeline
const MODELINE_WINDOW: usize = 5;

static MODELINE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<!--\s*docs-ls:\s*profile\s*=\s*([\w-]+)\s*-->").ok());

/// A formatting problem found while parsing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormatIssue {
    /// A fence that is never closed; its snippet runs to end of file
    UnterminatedFence { line: usize, marker: String },
}

/// Result of parsing a document
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: Document,
    pub issues: Vec<FormatIssue>,
}

struct OpenSnippet {
    line: usize,
    marker: FenceMarker,
    lines: Vec<String>,
}

struct SectionBuilder {
    section: Section,
    /// Last prose line, candidate for a setext heading
    pending_text: Option<(usize, String)>,
    /// Inside a list since the last blank line
    in_list: bool,
}

impl SectionBuilder {
    fn preamble() -> Self {
        Self::new(String::new(), 0, String::new(), false, 1)
    }

    fn new(heading: String, level: u8, anchor: String, duplicate_anchor: bool, line: usize) -> Self {
        Self {
            section: Section {
                heading,
                level,
                anchor,
                duplicate_anchor,
                line,
                end_line: line,
                body: String::new(),
                snippets: Vec::new(),
                links: Vec::new(),
            },
            pending_text: None,
            in_list: false,
        }
    }

    fn push_body_line(&mut self, line: &str) {
        if !self.section.body.is_empty() {
            self.section.body.push('\n');
        }
        self.section.body.push_str(line);
    }

    /// Add a prose line
    ///
    /// List items and their indented continuations never become setext
    /// headings.
    fn push_text(&mut self, line: &str, line_num: usize) {
        self.push_body_line(line);
        self.section.links.extend(scan_links(line, line_num));
        if list_item(line).is_some() {
            self.in_list = true;
            self.pending_text = None;
        } else if self.in_list && is_indented(line) {
            self.pending_text = None;
        } else {
            self.in_list = false;
            self.pending_text = Some((line_num, line.to_string()));
        }
    }

    /// Take back the last prose line so it can become a setext heading
    fn pop_pending_text(&mut self) -> Option<(usize, String)> {
        let (line_num, text) = self.pending_text.take()?;
        let body = &mut self.section.body;
        let cut = body.rfind('\n').unwrap_or(0);
        body.truncate(cut);
        self.section.links.retain(|l| l.line != line_num);
        Some((line_num, text))
    }

    fn has_content(&self) -> bool {
        !self.section.body.trim().is_empty() || !self.section.snippets.is_empty()
    }
}

/// Parse a whole document
///
/// This is the main entry point: it drives the `Lexer` and groups lines
/// into sections, snippets and links.
pub fn parse_document(name: &str, text: &str) -> ParsedDocument {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = SectionBuilder::preamble();
    let mut open: Option<OpenSnippet> = None;
    let mut slugs = links::SlugAllocator::new();
    let mut title: Option<String> = None;
    let mut issues = Vec::new();

    let mut start_section =
        |current: &mut SectionBuilder, sections: &mut Vec<Section>, level: u8, heading: String, line: usize| {
            if level == 1 && title.is_none() {
                title = Some(heading.clone());
            }
            let (anchor, duplicate) = slugs.allocate(&heading);
            let finished = std::mem::replace(
                current,
                SectionBuilder::new(heading, level, anchor, duplicate, line),
            );
            if !finished.section.is_preamble() || finished.has_content() {
                sections.push(finished.section);
            }
        };

    for (line_num, token) in Lexer::new(text) {
        match token {
            Token::Blank => {
                current.pending_text = None;
                current.in_list = false;
                current.push_body_line("");
            }
            Token::Heading { level, text } => {
                start_section(&mut current, &mut sections, level, text, line_num);
            }
            Token::SetextUnderline { level, raw } => match current.pop_pending_text() {
                Some((heading_line, heading)) => {
                    start_section(
                        &mut current,
                        &mut sections,
                        level,
                        heading.trim().to_string(),
                        heading_line,
                    );
                }
                // Thematic break
                None if level == 2 => {
                    current.in_list = false;
                    current.push_body_line(raw);
                }
                None => current.push_text(raw, line_num),
            },
            Token::FenceOpen(marker) => {
                current.pending_text = None;
                current.in_list = false;
                open = Some(OpenSnippet {
                    line: line_num,
                    marker,
                    lines: Vec::new(),
                });
            }
            Token::FenceContent(content) => {
                if let Some(snippet) = open.as_mut() {
                    snippet.lines.push(content.to_string());
                }
            }
            Token::FenceClose => {
                if let Some(snippet) = open.take() {
                    current
                        .section
                        .snippets
                        .push(finish_snippet(snippet, Some(line_num)));
                }
            }
            Token::Text(line) => current.push_text(line, line_num),
        }
    }

    if let Some(snippet) = open.take() {
        issues.push(FormatIssue::UnterminatedFence {
            line: snippet.line,
            marker: snippet.marker.marker(),
        });
        current.section.snippets.push(finish_snippet(snippet, None));
    }

    if !current.section.is_preamble() || current.has_content() {
        sections.push(current.section);
    }

    let line_count = text.lines().count();
    let next_starts: Vec<usize> = sections.iter().skip(1).map(|s| s.line).collect();
    for (idx, section) in sections.iter_mut().enumerate() {
        section.end_line = match next_starts.get(idx) {
            Some(next) => next.saturating_sub(1).max(section.line),
            None => line_count.max(section.line),
        };
    }

    let document = Document {
        name: name.to_string(),
        title,
        sections,
        profile: modeline_profile(text),
        line_count,
    };

    ParsedDocument { document, issues }
}

fn finish_snippet(open: OpenSnippet, end_line: Option<usize>) -> Snippet {
    let (language, label, flags) = SnippetLabel::parse_info(&open.marker.info);
    Snippet {
        language,
        label,
        flags,
        info: open.marker.info.clone(),
        text: open.lines.join("\n"),
        line: open.line,
        end_line,
        marker: open.marker.marker(),
    }
}

/// Extract the profile name from a `<!-- docs-ls: profile=NAME -->` modeline
///
/// Only the first and last few lines are searched.
pub fn modeline_profile(content: &str) -> Option<String> {
    let re = MODELINE_RE.as_ref()?;
    let lines: Vec<&str> = content.lines().collect();
    let head = lines.iter().take(MODELINE_WINDOW);
    let tail = lines
        .iter()
        .skip(lines.len().saturating_sub(MODELINE_WINDOW).max(MODELINE_WINDOW));

    head.chain(tail)
        .find_map(|line| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::SnippetLabel;

    const GUIDE: &str = "# Adopting static types

Intro paragraph with a [link](#converting-reducers).

## Converting reducers

```js before
function reducer(state, action) { return state; }
```

```ts after
function reducer(state: State, action: Action): State { return state; }
```

Connected components
--------------------

Prose.
";

    #[test]
    fn test_parse_sections_and_title() {
        let parsed = parse_document("guide.md", GUIDE);
        let doc = parsed.document;

        assert!(parsed.issues.is_empty());
        assert_eq!(doc.title.as_deref(), Some("Adopting static types"));
        assert_eq!(doc.sections.len(), 3);
        assert_eq!(doc.sections[0].anchor, "adopting-static-types");
        assert_eq!(doc.sections[1].heading, "Converting reducers");
        assert_eq!(doc.sections[1].level, 2);
        assert_eq!(doc.sections[2].heading, "Connected components");
        assert_eq!(doc.sections[2].line, 15);
        assert_eq!(doc.sections[2].level, 2);
    }

    #[test]
    fn test_parse_snippets_in_order() {
        let doc = parse_document("guide.md", GUIDE).document;
        let snippets: Vec<_> = doc.snippets().collect();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].language, "js");
        assert_eq!(snippets[0].label, SnippetLabel::Before);
        assert_eq!(snippets[0].line, 7);
        assert_eq!(snippets[0].end_line, Some(9));
        assert_eq!(snippets[1].label, SnippetLabel::After);
        assert!(snippets[1].text.contains("State"));
    }

    #[test]
    fn test_parse_links_and_body() {
        let doc = parse_document("guide.md", GUIDE).document;
        let links: Vec<_> = doc.links().collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "#converting-reducers");
        assert!(doc.sections[0].body.contains("Intro paragraph"));
        assert!(!doc.sections[1].body.contains("function reducer"));
    }

    #[test]
    fn test_preamble_section() {
        let doc = parse_document("a.md", "```sh\nnpm i\n```\n# Title\n").document;
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].is_preamble());
        assert_eq!(doc.sections[0].snippets.len(), 1);
        assert_eq!(doc.sections[1].heading, "Title");
    }

    #[test]
    fn test_empty_preamble_is_dropped() {
        let doc = parse_document("a.md", "\n\n# Title\ntext\n").document;
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].end_line, 4);
    }

    #[test]
    fn test_unterminated_fence_is_reported() {
        let parsed = parse_document("a.md", "# T\n```ts\nconst x = 1;\n");
        assert_eq!(
            parsed.issues,
            vec![FormatIssue::UnterminatedFence {
                line: 2,
                marker: "```".to_string()
            }]
        );
        let snippet = parsed.document.snippets().next().expect("snippet kept");
        assert_eq!(snippet.text, "const x = 1;");
        assert_eq!(snippet.end_line, None);
    }

    #[test]
    fn test_thematic_break_without_text_is_not_heading() {
        let doc = parse_document("a.md", "# T\n\n---\n").document;
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_list_items_never_become_setext_headings() {
        let doc = parse_document("a.md", "# T\n\n- install tsc\n---\n").document;
        let headings: Vec<_> = doc.headed_sections().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["T"]);
        assert!(doc.sections[0].body.contains("- install tsc"));

        let doc = parse_document(
            "a.md",
            "# Guide\n\n1. step one\n   continued\n===\n\n## Usage\n",
        )
        .document;
        let anchors: Vec<_> = doc.headed_sections().map(|s| s.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["guide", "usage"]);
    }

    #[test]
    fn test_text_after_list_can_be_setext_heading() {
        let doc = parse_document("a.md", "# T\n\n- item\n\nNext steps\n---\n").document;
        let headings: Vec<_> = doc.headed_sections().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["T", "Next steps"]);
    }

    #[test]
    fn test_modeline_profile() {
        let text = "<!-- docs-ls: profile=frontend -->\n# Title\n";
        assert_eq!(modeline_profile(text), Some("frontend".to_string()));

        let mut long = String::from("# Title\n");
        for i in 0..20 {
            long.push_str(&format!("line {}\n", i));
        }
        long.push_str("<!-- docs-ls: profile=strict -->\n");
        assert_eq!(modeline_profile(&long), Some("strict".to_string()));

        let mut middle = String::new();
        for i in 0..20 {
            if i == 10 {
                middle.push_str("<!-- docs-ls: profile=hidden -->\n");
            }
            middle.push_str("text\n");
        }
        assert_eq!(modeline_profile(&middle), None);
    }

    #[test]
    fn test_duplicate_headings_get_unique_anchors() {
        let doc = parse_document("a.md", "# T\n## Example\n## Example\n").document;
        assert_eq!(doc.sections[1].anchor, "example");
        assert!(!doc.sections[1].duplicate_anchor);
        assert_eq!(doc.sections[2].anchor, "example-1");
        assert!(doc.sections[2].duplicate_anchor);
    }
}
