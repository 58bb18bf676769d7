//! Validation Engine
//!
//! Core lint logic separated from parsing and LSP concerns.

use serde::Serialize;

use crate::core::store::LinkResolver;
use crate::parser::{parse_document, ParsedDocument};
use crate::profile::{Profile, ProfileRegistry};
use crate::validation::rules::RuleRegistry;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic message for an authoring issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based line
    pub line: usize,
    /// 0-based character column
    pub column: usize,
    /// Length in characters; 0 means "to end of line"
    pub length: usize,
    /// Rule that produced the diagnostic
    pub rule: String,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(severity: Severity, rule: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: 0,
            length: 0,
            rule: rule.to_string(),
            message: message.into(),
            severity,
        }
    }

    pub fn error(rule: &str, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, rule, line, message)
    }

    pub fn warning(rule: &str, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule, line, message)
    }

    pub fn info(rule: &str, line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule, line, message)
    }

    /// Narrow the diagnostic to a column range
    pub fn at(mut self, column: usize, length: usize) -> Self {
        self.column = column;
        self.length = length;
        self
    }
}

/// Result of validating a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_error(&mut self, rule: &str, line: usize, message: String) {
        self.push(Diagnostic::error(rule, line, message));
    }

    pub fn add_warning(&mut self, rule: &str, line: usize, message: String) {
        self.push(Diagnostic::warning(rule, line, message));
    }

    pub fn extend(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_valid(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Order by line, then column, then severity
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| (a.line, a.column, a.severity).cmp(&(b.line, b.column, b.severity)));
    }
}

/// Everything a lint rule may consult besides the document itself
pub struct LintContext<'a> {
    /// Profile the document is checked against, if any
    pub profile: Option<&'a Profile>,
    /// Resolver for links to other documents; without one they are not checked
    pub resolver: Option<&'a dyn LinkResolver>,
}

impl<'a> LintContext<'a> {
    pub fn new(profile: Option<&'a Profile>) -> Self {
        Self {
            profile,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn LinkResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// Run every enabled rule over a parsed document
pub fn lint_document(
    parsed: &ParsedDocument,
    ctx: &LintContext<'_>,
    rules: &RuleRegistry,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    for rule in rules.rules() {
        result.diagnostics.extend(rule.check(parsed, ctx));
    }

    result.sort();
    result
}

/// Validate a single document with the built-in rules
///
/// The profile is chosen by modeline, falling back to the registry's active
/// profile. Links to other documents are not checked here; use a
/// `LintContext` with a resolver for that.
pub fn validate_document(content: &str, profiles: &ProfileRegistry) -> ValidationResult {
    let parsed = parse_document("", content);
    let ctx = LintContext::new(profiles.profile_for(content));
    lint_document(&parsed, &ctx, &RuleRegistry::new())
}
