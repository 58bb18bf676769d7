//! Validation Engine
//!
//! Presentation lint rules and the opt-in snippet validator, kept apart
//! from parsing and LSP concerns.

pub mod engine;
pub mod rules;
pub mod snippet;

pub use engine::{
    lint_document, validate_document, Diagnostic, LintContext, Severity, ValidationResult,
};
pub use rules::{LintRule, RuleRegistry};
pub use snippet::{CheckOutcome, SnippetValidator, DEFAULT_SNIPPET_TIMEOUT};
