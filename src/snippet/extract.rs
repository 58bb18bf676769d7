//! Snippet extraction and before/after pairing.

use serde::Serialize;
use thiserror::Error;

use crate::parser::{parse_document, FormatIssue, Section, Snippet};
use crate::snippet::{SnippetFlags, SnippetLabel};

/// Errors raised when a document cannot be split into snippets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unterminated code fence opened at line {line} (expected closing {marker})")]
    UnterminatedFence { line: usize, marker: String },
}

/// An extracted `(label, text)` pair with the context needed to report on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSnippet {
    pub label: SnippetLabel,
    pub text: String,
    pub language: String,
    pub flags: SnippetFlags,
    /// 1-based line of the opening fence
    pub line: usize,
    /// Heading of the owning section (empty for the preamble)
    pub section: String,
}

impl LabeledSnippet {
    fn from_snippet(snippet: &Snippet, section: &Section) -> Self {
        Self {
            label: snippet.label.clone(),
            text: snippet.text.clone(),
            language: snippet.language.clone(),
            flags: snippet.flags,
            line: snippet.line,
            section: section.heading.clone(),
        }
    }
}

/// Extract all snippets of a document in document order
///
/// Malformed fencing is an error rather than a silently truncated result.
pub fn extract_snippets(text: &str) -> Result<Vec<LabeledSnippet>, ExtractError> {
    let parsed = parse_document("", text);

    if let Some(FormatIssue::UnterminatedFence { line, marker }) = parsed.issues.first() {
        return Err(ExtractError::UnterminatedFence {
            line: *line,
            marker: marker.clone(),
        });
    }

    Ok(parsed
        .document
        .sections
        .iter()
        .flat_map(|section| {
            section
                .snippets
                .iter()
                .map(move |snippet| LabeledSnippet::from_snippet(snippet, section))
        })
        .collect())
}

/// A matched before/after pair within one section
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetPair<'a> {
    pub before: &'a Snippet,
    pub after: &'a Snippet,
}

/// Result of pairing the snippets of a section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing<'a> {
    pub pairs: Vec<SnippetPair<'a>>,
    /// `before` snippets with no later `after`
    pub unmatched_before: Vec<&'a Snippet>,
    /// `after` snippets with no earlier `before`
    pub unmatched_after: Vec<&'a Snippet>,
}

/// Match each `before` with the next `after` in the same section
pub fn pair_snippets(section: &Section) -> Pairing<'_> {
    let mut pairing = Pairing::default();
    let mut waiting: Option<&Snippet> = None;

    for snippet in &section.snippets {
        match snippet.label {
            SnippetLabel::Before => {
                if let Some(previous) = waiting.replace(snippet) {
                    pairing.unmatched_before.push(previous);
                }
            }
            SnippetLabel::After => match waiting.take() {
                Some(before) => pairing.pairs.push(SnippetPair {
                    before,
                    after: snippet,
                }),
                None => pairing.unmatched_after.push(snippet),
            },
            _ => {}
        }
    }

    if let Some(before) = waiting {
        pairing.unmatched_before.push(before);
    }

    pairing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_labels_in_order() {
        let text = "# Reducers\n\n```js before\nold\n```\n\n```ts after\nnew\n```\n\n## Notes\n```ts\nplain\n```\n";
        let snippets = extract_snippets(text).expect("well-formed");

        let pairs: Vec<(SnippetLabel, &str)> = snippets
            .iter()
            .map(|s| (s.label.clone(), s.text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (SnippetLabel::Before, "old"),
                (SnippetLabel::After, "new"),
                (SnippetLabel::Unlabelled, "plain"),
            ]
        );
        assert_eq!(snippets[2].section, "Notes");
        assert_eq!(snippets[0].line, 3);
    }

    #[test]
    fn test_extract_unterminated_fence_is_error() {
        let err = extract_snippets("# T\n\n~~~ts\nconst a = 1;\n```\n").unwrap_err();
        assert_eq!(
            err,
            ExtractError::UnterminatedFence {
                line: 3,
                marker: "~~~".to_string()
            }
        );
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_extract_empty_document() {
        assert!(extract_snippets("").expect("empty is fine").is_empty());
    }

    #[test]
    fn test_pair_snippets() {
        let text = "# T\n```js before\na\n```\n```js before\nb\n```\n```ts after\nc\n```\n```ts after\nd\n```\n";
        let doc = parse_document("t.md", text).document;
        let pairing = pair_snippets(&doc.sections[0]);

        assert_eq!(pairing.pairs.len(), 1);
        assert_eq!(pairing.pairs[0].before.text, "b");
        assert_eq!(pairing.pairs[0].after.text, "c");
        assert_eq!(pairing.unmatched_before.len(), 1);
        assert_eq!(pairing.unmatched_before[0].text, "a");
        assert_eq!(pairing.unmatched_after.len(), 1);
        assert_eq!(pairing.unmatched_after[0].text, "d");
    }
}
