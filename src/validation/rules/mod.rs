//! Lint Rules
//!
//! Presentation-level checks over a parsed document.

mod links;
mod snippets;
mod structure;

pub use links::BrokenLinkRule;
pub use snippets::{
    EmptySnippetRule, MissingLanguageRule, UnknownLabelRule, UnknownLanguageRule,
    UnpairedSnippetRule,
};
pub use structure::{DuplicateHeadingRule, MissingTitleRule, UnterminatedFenceRule};

use crate::parser::ParsedDocument;
use crate::validation::engine::{Diagnostic, LintContext};

/// Trait for implementing lint rules
pub trait LintRule: Send + Sync {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check a parsed document
    fn check(&self, parsed: &ParsedDocument, ctx: &LintContext<'_>) -> Vec<Diagnostic>;
}

/// Registry of enabled lint rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(UnterminatedFenceRule),
                Box::new(MissingTitleRule),
                Box::new(BrokenLinkRule),
                Box::new(MissingLanguageRule),
                Box::new(UnknownLanguageRule),
                Box::new(UnknownLabelRule),
                Box::new(UnpairedSnippetRule),
                Box::new(EmptySnippetRule),
                Box::new(DuplicateHeadingRule),
            ],
        }
    }

    /// Built-in rules minus the named ones
    pub fn without(disabled: &[String]) -> Self {
        let mut registry = Self::new();
        for name in disabled {
            if !registry.rules.iter().any(|r| r.name() == name) {
                log::warn!("Unknown lint rule '{}' in disabled_rules", name);
            }
        }
        registry
            .rules
            .retain(|rule| !disabled.iter().any(|name| name == rule.name()));
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_are_unique() {
        let registry = RuleRegistry::new();
        let mut names: Vec<_> = registry.rules().iter().map(|r| r.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_without_disables_rules() {
        let registry = RuleRegistry::without(&["duplicate-heading".to_string(), "bogus".to_string()]);
        assert!(registry.rules().iter().all(|r| r.name() != "duplicate-heading"));
        assert_eq!(registry.rules().len(), RuleRegistry::new().rules().len() - 1);
    }

    #[test]
    fn test_every_rule_has_description() {
        for rule in RuleRegistry::new().rules() {
            assert!(!rule.description().is_empty(), "{} has no description", rule.name());
        }
    }
}
