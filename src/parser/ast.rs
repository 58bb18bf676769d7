//! Document Model
//!
//! Documents, sections and snippets as produced by the parser.
//! No validation logic or LSP concerns - pure data representation.

use serde::Serialize;

use crate::parser::links::Link;
use crate::snippet::{SnippetFlags, SnippetLabel};

/// A single guidance page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Name of the document (relative path or URI path)
    pub name: String,
    /// Text of the first level-1 heading, if any
    pub title: Option<String>,
    /// Sections in document order; the first one may be the preamble
    pub sections: Vec<Section>,
    /// Profile requested by a modeline comment
    pub profile: Option<String>,
    /// Number of lines in the source text
    pub line_count: usize,
}

/// A titled subdivision of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Heading text (empty for the preamble)
    pub heading: String,
    /// Heading level 1-6, or 0 for the preamble
    pub level: u8,
    /// Unique anchor slug within the document (empty for the preamble)
    pub anchor: String,
    /// Set when the heading's base slug was already used by an earlier heading
    pub duplicate_anchor: bool,
    /// 1-based line of the heading (first line for the preamble)
    pub line: usize,
    /// 1-based last line of the section
    pub end_line: usize,
    /// Prose lines joined with '\n' (snippets excluded)
    pub body: String,
    pub snippets: Vec<Snippet>,
    pub links: Vec<Link>,
}

/// A fenced code block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    /// First word of the info string (may be empty)
    pub language: String,
    pub label: SnippetLabel,
    pub flags: SnippetFlags,
    /// Raw fence info string
    pub info: String,
    /// Content between the fences
    pub text: String,
    /// 1-based line of the opening fence
    pub line: usize,
    /// 1-based line of the closing fence, `None` when unterminated
    pub end_line: Option<usize>,
    /// Opening marker, e.g. "```"
    pub marker: String,
}

impl Section {
    /// Whether this is the implicit section before the first heading
    pub fn is_preamble(&self) -> bool {
        self.level == 0
    }
}

impl Document {
    /// Sections that have a heading (preamble excluded)
    pub fn headed_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.is_preamble())
    }

    /// All snippets in document order
    pub fn snippets(&self) -> impl Iterator<Item = &Snippet> {
        self.sections.iter().flat_map(|s| s.snippets.iter())
    }

    /// All links in document order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.sections.iter().flat_map(|s| s.links.iter())
    }

    /// Find a section by anchor slug
    pub fn section_by_anchor(&self, anchor: &str) -> Option<&Section> {
        self.headed_sections().find(|s| s.anchor == anchor)
    }

    /// Whether the anchor exists in this document
    pub fn has_anchor(&self, anchor: &str) -> bool {
        self.section_by_anchor(anchor).is_some()
    }

    /// The section containing the 1-based line
    pub fn section_at_line(&self, line: usize) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| line >= s.line && line <= s.end_line)
    }

    /// The snippet whose fences enclose the 1-based line
    pub fn snippet_at_line(&self, line: usize) -> Option<&Snippet> {
        self.snippets().find(|snippet| {
            let end = snippet.end_line.unwrap_or(self.line_count);
            line >= snippet.line && line <= end
        })
    }

    /// Title text if present and non-empty
    pub fn non_empty_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
