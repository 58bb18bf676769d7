use crate::parser::{FormatIssue, ParsedDocument};
use crate::validation::engine::{Diagnostic, LintContext};
use crate::validation::rules::LintRule;

/// Every opening fence needs a matching closing fence
pub struct UnterminatedFenceRule;

impl LintRule for UnterminatedFenceRule {
    fn name(&self) -> &'static str {
        "unterminated-fence"
    }

    fn description(&self) -> &'static str {
        "Code fences must be closed"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        parsed
            .issues
            .iter()
            .map(|issue| match issue {
                FormatIssue::UnterminatedFence { line, marker } => Diagnostic::error(
                    self.name(),
                    *line,
                    format!(
                        "Code fence is never closed; add a closing {} line",
                        marker
                    ),
                ),
            })
            .collect()
    }
}

/// Every document needs a non-empty level-1 heading
pub struct MissingTitleRule;

impl LintRule for MissingTitleRule {
    fn name(&self) -> &'static str {
        "missing-title"
    }

    fn description(&self) -> &'static str {
        "Documents must start with a non-empty level-1 heading"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let doc = &parsed.document;
        if doc.non_empty_title().is_some() {
            return Vec::new();
        }

        let diagnostic = match &doc.title {
            Some(_) => {
                let line = doc
                    .headed_sections()
                    .find(|s| s.level == 1)
                    .map(|s| s.line)
                    .unwrap_or(1);
                Diagnostic::error(self.name(), line, "Document title is empty")
            }
            None => Diagnostic::error(
                self.name(),
                1,
                "Document has no title; add a '# Title' heading",
            ),
        };
        vec![diagnostic]
    }
}

/// Headings that collide on the same anchor slug
pub struct DuplicateHeadingRule;

impl LintRule for DuplicateHeadingRule {
    fn name(&self) -> &'static str {
        "duplicate-heading"
    }

    fn description(&self) -> &'static str {
        "Headings sharing an anchor get numbered suffixes"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        parsed
            .document
            .headed_sections()
            .filter(|s| s.duplicate_anchor)
            .map(|s| {
                Diagnostic::info(
                    self.name(),
                    s.line,
                    format!(
                        "Heading '{}' repeats an earlier anchor; link to it as '#{}'",
                        s.heading, s.anchor
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn run(rule: &dyn LintRule, text: &str) -> Vec<Diagnostic> {
        let parsed = parse_document("t.md", text);
        rule.check(&parsed, &LintContext::new(None))
    }

    #[test]
    fn test_unterminated_fence() {
        let diagnostics = run(&UnterminatedFenceRule, "# T\n````ts\ncode\n```\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
        assert!(diagnostics[0].message.contains("````"));
    }

    #[test]
    fn test_missing_title() {
        let diagnostics = run(&MissingTitleRule, "## Only a subsection\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 1);
        assert!(diagnostics[0].message.contains("no title"));
    }

    #[test]
    fn test_empty_title() {
        let diagnostics = run(&MissingTitleRule, "\n#\ntext\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
        assert!(diagnostics[0].message.contains("empty"));
    }

    #[test]
    fn test_setext_title_counts() {
        assert!(run(&MissingTitleRule, "Guide\n=====\n").is_empty());
    }

    #[test]
    fn test_duplicate_heading() {
        let diagnostics = run(&DuplicateHeadingRule, "# T\n## Example\n## Example\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 3);
        assert!(diagnostics[0].message.contains("#example-1"));
    }
}
