use crate::parser::ParsedDocument;
use crate::snippet::pair_snippets;
use crate::validation::engine::{Diagnostic, LintContext};
use crate::validation::rules::LintRule;

/// Fences should declare a language
pub struct MissingLanguageRule;

impl LintRule for MissingLanguageRule {
    fn name(&self) -> &'static str {
        "missing-language"
    }

    fn description(&self) -> &'static str {
        "Code fences should declare a language"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        parsed
            .document
            .snippets()
            .filter(|s| s.language.is_empty())
            .map(|s| {
                Diagnostic::warning(
                    self.name(),
                    s.line,
                    format!("Code fence has no language; write {}ts, {}tsx, ...", s.marker, s.marker),
                )
            })
            .collect()
    }
}

/// Fence languages must be known to the active profile
pub struct UnknownLanguageRule;

impl LintRule for UnknownLanguageRule {
    fn name(&self) -> &'static str {
        "unknown-language"
    }

    fn description(&self) -> &'static str {
        "Snippet languages must be declared by the active profile"
    }

    fn check(&self, parsed: &ParsedDocument, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let Some(profile) = ctx.profile else {
            return Vec::new();
        };

        parsed
            .document
            .snippets()
            .filter(|s| !s.language.is_empty() && profile.language(&s.language).is_none())
            .map(|s| {
                Diagnostic::warning(
                    self.name(),
                    s.line,
                    format!(
                        "Language '{}' is not defined by profile '{}'",
                        s.language, profile.name
                    ),
                )
                .at(s.marker.chars().count(), s.language.chars().count())
            })
            .collect()
    }
}

/// Snippet labels must be recognised
pub struct UnknownLabelRule;

impl LintRule for UnknownLabelRule {
    fn name(&self) -> &'static str {
        "unknown-label"
    }

    fn description(&self) -> &'static str {
        "Snippet labels must be one of the allowed intent labels"
    }

    fn check(&self, parsed: &ParsedDocument, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        parsed
            .document
            .snippets()
            .filter(|s| match ctx.profile {
                Some(profile) => !profile.allows_label(&s.label),
                None => !s.label.is_builtin(),
            })
            .map(|s| {
                let allowed = match ctx.profile {
                    Some(profile) => profile.label_names().join(", "),
                    None => crate::snippet::SnippetLabel::BUILTIN.join(", "),
                };
                Diagnostic::warning(
                    self.name(),
                    s.line,
                    format!("Unknown snippet label '{}' (expected one of: {})", s.label, allowed),
                )
            })
            .collect()
    }
}

/// `before` snippets need a matching `after` in the same section
pub struct UnpairedSnippetRule;

impl LintRule for UnpairedSnippetRule {
    fn name(&self) -> &'static str {
        "unpaired-snippet"
    }

    fn description(&self) -> &'static str {
        "Before/after snippets must come in pairs within a section"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for section in &parsed.document.sections {
            let pairing = pair_snippets(section);
            for snippet in pairing.unmatched_before {
                diagnostics.push(Diagnostic::warning(
                    self.name(),
                    snippet.line,
                    "'before' snippet has no matching 'after' snippet later in this section",
                ));
            }
            for snippet in pairing.unmatched_after {
                diagnostics.push(Diagnostic::warning(
                    self.name(),
                    snippet.line,
                    "'after' snippet has no preceding 'before' snippet in this section",
                ));
            }
        }

        diagnostics
    }
}

/// Fences with nothing in them
pub struct EmptySnippetRule;

impl LintRule for EmptySnippetRule {
    fn name(&self) -> &'static str {
        "empty-snippet"
    }

    fn description(&self) -> &'static str {
        "Code fences must contain code"
    }

    fn check(&self, parsed: &ParsedDocument, _ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        parsed
            .document
            .snippets()
            .filter(|s| s.text.trim().is_empty())
            .map(|s| Diagnostic::warning(self.name(), s.line, "Code fence is empty"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::profile::ProfileRegistry;

    fn run(rule: &dyn LintRule, text: &str, with_profile: bool) -> Vec<Diagnostic> {
        let registry = ProfileRegistry::with_default_profile();
        let parsed = parse_document("t.md", text);
        let profile = if with_profile {
            registry.get_active_profile()
        } else {
            None
        };
        rule.check(&parsed, &LintContext::new(profile))
    }

    #[test]
    fn test_missing_language() {
        let diagnostics = run(&MissingLanguageRule, "# T\n```\nx\n```\n```ts\ny\n```\n", true);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_unknown_language_needs_profile() {
        let text = "# T\n```cobol\nDISPLAY 'HI'.\n```\n```ts\nlet a = 1;\n```\n";
        assert!(run(&UnknownLanguageRule, text, false).is_empty());

        let diagnostics = run(&UnknownLanguageRule, text, true);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("cobol"));
        assert_eq!(diagnostics[0].column, 3);
        assert_eq!(diagnostics[0].length, 5);
    }

    #[test]
    fn test_unknown_label() {
        let text = "# T\n```ts worse\na\n```\n```ts good\nb\n```\n";
        let diagnostics = run(&UnknownLabelRule, text, true);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'worse'"));

        assert_eq!(run(&UnknownLabelRule, text, false).len(), 1);
    }

    #[test]
    fn test_quoted_title_is_not_a_label() {
        let text = "# T\n```ts title=\"my store.ts\"\nlet a = 1;\n```\n";
        assert!(run(&UnknownLabelRule, text, true).is_empty());
        assert!(run(&UnknownLabelRule, text, false).is_empty());
    }

    #[test]
    fn test_unpaired_snippets() {
        let text = "# T\n## A\n```js before\na\n```\n## B\n```ts after\nb\n```\n";
        let diagnostics = run(&UnpairedSnippetRule, text, false);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.starts_with("'before'"));
        assert!(diagnostics[1].message.starts_with("'after'"));
    }

    #[test]
    fn test_paired_snippets_are_fine() {
        let text = "# T\n```js before\na\n```\nprose\n```ts after\nb\n```\n";
        assert!(run(&UnpairedSnippetRule, text, false).is_empty());
    }

    #[test]
    fn test_empty_snippet() {
        let diagnostics = run(&EmptySnippetRule, "# T\n```ts\n\n   \n```\n", false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
    }
}
