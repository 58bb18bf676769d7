//! Diagnostic Reports
//!
//! Collects per-document validation results and formats them for the CLI.

use std::fmt::Write as _;

use colored::Colorize;
use serde::Serialize;

use crate::validation::{Severity, ValidationResult};

/// Diagnostics for one document
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Display name (path on disk or store name)
    pub name: String,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Diagnostics for a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, mut result: ValidationResult) {
        result.sort();
        self.files.push(FileReport {
            name: name.into(),
            result,
        });
    }

    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.files.iter().map(|f| f.result.count(severity)).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|f| !f.result.is_valid())
    }

    /// Human readable listing; info diagnostics only when `verbose`
    pub fn render_text(&self, verbose: bool) -> String {
        let mut out = String::new();

        for file in &self.files {
            let shown: Vec<_> = file
                .result
                .diagnostics
                .iter()
                .filter(|d| verbose || d.severity != Severity::Info)
                .collect();

            if shown.is_empty() {
                if verbose {
                    let _ = writeln!(out, "{} {}", "✓".green(), file.name);
                }
                continue;
            }

            let _ = writeln!(out, "{}", file.name.bold());
            for diagnostic in shown {
                let level = match diagnostic.severity {
                    Severity::Error => "error".red().bold(),
                    Severity::Warning => "warning".yellow().bold(),
                    Severity::Info => "info".blue().bold(),
                };
                let _ = writeln!(
                    out,
                    "  {}:{} {} [{}] {}",
                    diagnostic.line,
                    diagnostic.column + 1,
                    level,
                    diagnostic.rule,
                    diagnostic.message
                );
            }
            out.push('\n');
        }

        let errors = self.count(Severity::Error);
        let warnings = self.count(Severity::Warning);
        let _ = writeln!(out, "Files checked: {}", self.files_checked());
        if errors > 0 {
            let _ = writeln!(out, "{} {}", "Errors:".red(), errors);
        }
        if warnings > 0 {
            let _ = writeln!(out, "{} {}", "Warnings:".yellow(), warnings);
        }
        if errors == 0 && warnings == 0 {
            let _ = writeln!(out, "{} No issues found", "✓".green());
        }

        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
