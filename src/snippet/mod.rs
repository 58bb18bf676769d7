//! Snippet Extraction
//!
//! Fenced code blocks, their intent labels, and before/after pairing.

pub mod extract;
pub mod label;

pub use extract::{extract_snippets, pair_snippets, ExtractError, LabeledSnippet, Pairing, SnippetPair};
pub use label::{SnippetFlags, SnippetLabel};
