//! Snippet Validator
//!
//! Runs each snippet through the checker its profile declares for the
//! snippet's language: an in-process parser for JSON and TOML, or an
//! external toolchain command.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::parser::{Document, Snippet};
use crate::profile::{BuiltinChecker, LanguageDef, Profile};
use crate::validation::engine::{Diagnostic, ValidationResult};

/// Rule name for snippets the toolchain rejected
pub const SNIPPET_COMPILE_RULE: &str = "snippet-compile";
/// Rule name for toolchains that could not be run
pub const SNIPPET_TOOLCHAIN_RULE: &str = "snippet-toolchain";

pub const DEFAULT_SNIPPET_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder in a command argv replaced by the snippet file path
const FILE_PLACEHOLDER: &str = "{file}";
/// Toolchain output lines kept in a diagnostic message
const MAX_OUTPUT_LINES: usize = 20;

/// What happened when a snippet was checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    /// The checker rejected the snippet; carries its output
    Failed(String),
    /// The checker itself could not run to completion
    Unavailable(String),
}

/// Checks snippets against a profile's toolchain definitions
#[derive(Debug, Clone)]
pub struct SnippetValidator<'a> {
    profile: &'a Profile,
    timeout: Duration,
}

impl<'a> SnippetValidator<'a> {
    pub fn new(profile: &'a Profile, timeout: Duration) -> Self {
        Self { profile, timeout }
    }

    /// Validate every checkable snippet of a document, in document order
    pub async fn validate(&self, document: &Document) -> ValidationResult {
        let mut result = ValidationResult::new();

        for snippet in document.snippets() {
            let Some(outcome) = self.check_snippet(snippet).await else {
                continue;
            };
            if let Some(diagnostic) = outcome_diagnostic(snippet, outcome) {
                result.push(diagnostic);
            }
        }

        result
    }

    /// Check one snippet; `None` when it is skipped
    pub async fn check_snippet(&self, snippet: &Snippet) -> Option<CheckOutcome> {
        if snippet.flags.ignore {
            log::debug!("Skipping snippet at line {}: marked ignore", snippet.line);
            return None;
        }
        if snippet.end_line.is_none() {
            log::debug!("Skipping snippet at line {}: fence never closed", snippet.line);
            return None;
        }

        let Some(language) = self.profile.language(&snippet.language) else {
            log::debug!(
                "Skipping snippet at line {}: language '{}' not in profile '{}'",
                snippet.line,
                snippet.language,
                self.profile.name
            );
            return None;
        };

        if let Some(builtin) = language.builtin {
            return Some(check_builtin(builtin, &snippet.text));
        }

        match &language.command {
            Some(argv) => Some(self.run_command(language, argv, &snippet.text).await),
            None => {
                log::debug!(
                    "Skipping snippet at line {}: '{}' has no checker",
                    snippet.line,
                    language.name
                );
                None
            }
        }
    }

    async fn run_command(&self, language: &LanguageDef, argv: &[String], text: &str) -> CheckOutcome {
        let Some(program) = argv.first() else {
            return CheckOutcome::Unavailable(format!(
                "Language '{}' declares an empty command",
                language.name
            ));
        };

        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return CheckOutcome::Unavailable(format!("Failed to create temp directory: {}", e));
            }
        };
        let file_name = format!("snippet.{}", language.file_extension());
        let path = dir.path().join(&file_name);
        if let Err(e) = tokio::fs::write(&path, text).await {
            return CheckOutcome::Unavailable(format!("Failed to write {}: {}", path.display(), e));
        }

        let args = substitute_file(&argv[1..], &path);
        log::debug!("Running {} {:?}", program, args);

        let child = Command::new(program)
            .args(&args)
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return CheckOutcome::Unavailable(format!(
                    "Could not run '{}' for {} snippets: {}",
                    program, language.name, e
                ));
            }
        };

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return CheckOutcome::Unavailable(format!("Failed to wait for '{}': {}", program, e));
            }
            Err(_) => {
                return CheckOutcome::Unavailable(format!(
                    "'{}' timed out after {} seconds",
                    program,
                    self.timeout.as_secs_f32()
                ));
            }
        };

        if output.status.success() {
            CheckOutcome::Passed
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let combined = format!("{}\n{}", stdout.trim(), stderr.trim());
            let cleaned = combined.replace(&path.to_string_lossy().into_owned(), &file_name);
            CheckOutcome::Failed(summarize_output(&cleaned, output.status.code()))
        }
    }
}

/// Replace the file placeholder in each argument, appending the path when
/// no argument mentions it
fn substitute_file(args: &[String], path: &Path) -> Vec<String> {
    let file = path.to_string_lossy();
    let mut substituted = false;
    let mut out: Vec<String> = args
        .iter()
        .map(|arg| {
            if arg.contains(FILE_PLACEHOLDER) {
                substituted = true;
                arg.replace(FILE_PLACEHOLDER, &file)
            } else {
                arg.clone()
            }
        })
        .collect();
    if !substituted {
        out.push(file.into_owned());
    }
    out
}

fn summarize_output(output: &str, code: Option<i32>) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let status = match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    if lines.is_empty() {
        return format!("Toolchain rejected the snippet ({})", status);
    }

    let mut message = format!("Toolchain rejected the snippet ({}):\n", status);
    message.push_str(&lines.iter().take(MAX_OUTPUT_LINES).copied().collect::<Vec<_>>().join("\n"));
    if lines.len() > MAX_OUTPUT_LINES {
        message.push_str(&format!("\n... {} more lines", lines.len() - MAX_OUTPUT_LINES));
    }
    message
}

/// Check a snippet with an in-process parser
pub fn check_builtin(checker: BuiltinChecker, text: &str) -> CheckOutcome {
    let error = match checker {
        BuiltinChecker::Json => serde_json::from_str::<serde_json::Value>(text)
            .err()
            .map(|e| e.to_string()),
        BuiltinChecker::Toml => toml::from_str::<toml::Table>(text).err().map(|e| e.to_string()),
    };
    match error {
        Some(message) => CheckOutcome::Failed(message.trim().to_string()),
        None => CheckOutcome::Passed,
    }
}

fn outcome_diagnostic(snippet: &Snippet, outcome: CheckOutcome) -> Option<Diagnostic> {
    let line = snippet.line;
    match (outcome, snippet.flags.fails) {
        (CheckOutcome::Passed, false) | (CheckOutcome::Failed(_), true) => None,
        (CheckOutcome::Passed, true) => Some(Diagnostic::error(
            SNIPPET_COMPILE_RULE,
            line,
            "Snippet is marked 'fails' but the toolchain accepted it",
        )),
        (CheckOutcome::Failed(message), false) => {
            Some(Diagnostic::error(SNIPPET_COMPILE_RULE, line, message))
        }
        (CheckOutcome::Unavailable(message), _) => {
            Some(Diagnostic::warning(SNIPPET_TOOLCHAIN_RULE, line, message))
        }
    }
}
