use crate::core::store::DocumentResolution;
use crate::parser::{LinkTarget, ParsedDocument};
use crate::validation::engine::{Diagnostic, LintContext};
use crate::validation::rules::LintRule;

/// Internal links must point at an existing document and anchor
pub struct BrokenLinkRule;

impl LintRule for BrokenLinkRule {
    fn name(&self) -> &'static str {
        "broken-link"
    }

    fn description(&self) -> &'static str {
        "Internal links must resolve to an existing document and anchor"
    }

    fn check(&self, parsed: &ParsedDocument, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let doc = &parsed.document;
        let mut diagnostics = Vec::new();

        for link in doc.links() {
            let message = match link.classify() {
                LinkTarget::Anchor(anchor) => {
                    if anchor.is_empty() || doc.has_anchor(anchor) {
                        continue;
                    }
                    format!("No heading with anchor '#{}' in this document", anchor)
                }
                LinkTarget::Document { path, anchor } => {
                    let Some(resolver) = ctx.resolver else {
                        continue;
                    };
                    match resolver.resolve(&doc.name, path, anchor) {
                        DocumentResolution::Resolved => continue,
                        DocumentResolution::MissingDocument(resolved) => {
                            format!("Linked document '{}' does not exist", resolved)
                        }
                        DocumentResolution::MissingAnchor { document, anchor } => {
                            format!("No heading with anchor '#{}' in '{}'", anchor, document)
                        }
                    }
                }
                LinkTarget::External => continue,
            };

            diagnostics.push(
                Diagnostic::error(self.name(), link.line, message).at(link.column, link.length),
            );
        }

        diagnostics
    }
}
