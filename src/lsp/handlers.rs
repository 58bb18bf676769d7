use std::path::PathBuf;

use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;

use crate::core::{read_linked_document, FileSystemResolver};
use crate::lsp::backend::Backend;
use crate::lsp::document::{char_index, utf16_col, utf16_len, DocumentState};
use crate::parser::{Document, LinkTarget, Section, Snippet};
use crate::profile::{LanguageDef, Profile};
use crate::validation::{lint_document, LintContext, Severity};

/// Trait for handling hover requests
#[tower_lsp::async_trait]
pub trait HandleHover {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>>;
}

/// Trait for handling completion requests
#[tower_lsp::async_trait]
pub trait HandleCompletion {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>>;
}

/// Trait for handling document symbols
#[tower_lsp::async_trait]
pub trait HandleDocumentSymbol {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>>;
}

/// Trait for handling go-to-definition on links
#[tower_lsp::async_trait]
pub trait HandleDefinition {
    async fn handle_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>>;
}

/// Trait for handling diagnostics
#[tower_lsp::async_trait]
pub trait HandleDiagnostics {
    async fn create_document_state(&self, uri: &Url, content: String) -> DocumentState;
    async fn publish_diagnostics(&self, uri: Url);
}

/// Directory containing a `file://` document
fn document_dir(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()?.parent().map(|p| p.to_path_buf())
}

/// A link to another document, copied out of the open buffer
struct LinkedTarget {
    dir: PathBuf,
    path: String,
    anchor: Option<String>,
}

impl LinkedTarget {
    fn new(uri: &Url, path: &str, anchor: Option<&str>) -> Option<Self> {
        Some(Self {
            dir: document_dir(uri)?,
            path: path.to_string(),
            anchor: anchor.map(str::to_string),
        })
    }
}

#[tower_lsp::async_trait]
impl HandleHover for Backend {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let tdpp = params.text_document_position_params;
        let uri = tdpp.text_document.uri;
        let pos = tdpp.position;

        let target = {
            let docs = self.documents.lock().await;
            let doc_state = match docs.get(&uri) {
                Some(state) => state,
                None => return Ok(None),
            };

            let line_idx = pos.line as usize;
            let line = doc_state.line(line_idx);
            let char_idx = char_index(line, pos.character);
            let document = &doc_state.parsed.document;

            // Opening fence: describe the snippet language and label
            if let Some(snippet) = document.snippets().find(|s| s.line == line_idx + 1) {
                let registry = self.profile_registry.lock().await;
                let profile = doc_state
                    .profile_name
                    .as_deref()
                    .and_then(|name| registry.get_profile(name));
                let language = profile.and_then(|p| p.language(&snippet.language));
                return Ok(Some(markdown_hover(snippet_hover(snippet, language))));
            }

            let Some(link) = doc_state.link_at(line_idx, char_idx) else {
                return Ok(None);
            };

            match link.classify() {
                LinkTarget::Anchor(anchor) => {
                    let text = match document.section_by_anchor(anchor) {
                        Some(section) => section_hover(section, None),
                        None => format!("No heading with anchor `#{}`", anchor),
                    };
                    return Ok(Some(markdown_hover(text)));
                }
                LinkTarget::Document { path, anchor } => LinkedTarget::new(&uri, path, anchor),
                LinkTarget::External => None,
            }
        };

        // The documents lock is released before reading from disk
        let Some(target) = target else {
            return Ok(None);
        };
        let Some(linked) = read_linked_document(&target.dir, &target.path).await else {
            return Ok(Some(markdown_hover(format!("`{}` does not exist", target.path))));
        };
        let section = match &target.anchor {
            Some(anchor) => linked.section_by_anchor(anchor),
            None => linked.headed_sections().next(),
        };
        let text = match section {
            Some(section) => section_hover(section, Some(&target.path)),
            None => format!("`{}`", target.path),
        };

        Ok(Some(markdown_hover(text)))
    }
}

fn markdown_hover(value: String) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    }
}

/// Hover text for an opening fence
pub fn snippet_hover(snippet: &Snippet, language: Option<&LanguageDef>) -> String {
    let name = match (language, snippet.language.as_str()) {
        (Some(lang), _) => lang.name.clone(),
        (None, "") => "no language".to_string(),
        (None, other) => other.to_string(),
    };
    let mut text = format!("**{}** snippet, label `{}`", name, snippet.label);

    if let Some(lang) = language {
        if let Some(description) = &lang.description {
            text.push_str(&format!("\n\n{}", description));
        }
        if let Some(builtin) = lang.builtin {
            text.push_str(&format!("\n\nChecked with the built-in {:?} parser", builtin));
        } else if let Some(command) = &lang.command {
            text.push_str(&format!("\n\nChecked with `{}`", command.join(" ")));
        }
    }

    let mut flags = Vec::new();
    if snippet.flags.ignore {
        flags.push("ignore");
    }
    if snippet.flags.fails {
        flags.push("fails");
    }
    if !flags.is_empty() {
        text.push_str(&format!("\n\nFlags: {}", flags.join(", ")));
    }

    text
}

/// Hover text for a link target heading
pub fn section_hover(section: &Section, document: Option<&str>) -> String {
    let mut text = match document {
        Some(doc) => format!("**{}** in `{}` (line {})", section.heading, doc, section.line),
        None => format!("**{}** (line {})", section.heading, section.line),
    };
    if let Some(first) = section.body.lines().map(str::trim).find(|l| !l.is_empty()) {
        text.push_str(&format!("\n\n{}", first));
    }
    text
}

/// What the text before the cursor asks to complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Typing the language right after an opening fence
    FenceLanguage(String),
    /// Typing words after the fence language
    FenceLabel,
    /// Typing an anchor inside `](#`
    Anchor(String),
    None,
}

/// Classify the text before the cursor
pub fn completion_context(before_cursor: &str) -> CompletionContext {
    let trimmed = before_cursor.trim_start();
    let indent = before_cursor.len() - trimmed.len();

    for fence_char in ['`', '~'] {
        let run = trimmed.chars().take_while(|c| *c == fence_char).count();
        if indent <= 3 && run >= 3 {
            let info = &trimmed[run..];
            if fence_char == '`' && info.contains('`') {
                break;
            }
            return if info.contains(char::is_whitespace) {
                CompletionContext::FenceLabel
            } else {
                CompletionContext::FenceLanguage(info.to_string())
            };
        }
    }

    if let Some(idx) = before_cursor.rfind("](#") {
        let partial = &before_cursor[idx + 3..];
        if !partial.contains([')', ' ']) {
            return CompletionContext::Anchor(partial.to_string());
        }
    }

    CompletionContext::None
}

/// Completion items for a context
pub fn completion_items(
    context: &CompletionContext,
    document: &Document,
    profile: Option<&Profile>,
) -> Vec<CompletionItem> {
    match context {
        CompletionContext::FenceLanguage(prefix) => {
            let Some(profile) = profile else {
                return Vec::new();
            };
            let prefix = prefix.to_lowercase();
            profile
                .language_names()
                .into_iter()
                .filter(|name| name.to_lowercase().starts_with(&prefix))
                .map(|name| {
                    let description = profile.language(name).and_then(|l| l.description.clone());
                    CompletionItem {
                        label: name.to_string(),
                        kind: Some(CompletionItemKind::KEYWORD),
                        detail: description,
                        ..Default::default()
                    }
                })
                .collect()
        }
        CompletionContext::FenceLabel => {
            let labels = match profile {
                Some(profile) => profile.label_names(),
                None => crate::snippet::SnippetLabel::BUILTIN
                    .iter()
                    .map(|l| l.to_string())
                    .collect(),
            };
            let mut items: Vec<CompletionItem> = labels
                .into_iter()
                .map(|label| CompletionItem {
                    label,
                    kind: Some(CompletionItemKind::ENUM_MEMBER),
                    detail: Some("snippet label".to_string()),
                    sort_text: Some("0".to_string()),
                    ..Default::default()
                })
                .collect();
            for (flag, detail) in [
                ("ignore", "never validate this snippet"),
                ("fails", "the toolchain must reject this snippet"),
            ] {
                items.push(CompletionItem {
                    label: flag.to_string(),
                    kind: Some(CompletionItemKind::PROPERTY),
                    detail: Some(detail.to_string()),
                    sort_text: Some("1".to_string()),
                    ..Default::default()
                });
            }
            items
        }
        CompletionContext::Anchor(prefix) => document
            .headed_sections()
            .filter(|s| s.anchor.starts_with(prefix.as_str()))
            .map(|s| CompletionItem {
                label: s.anchor.clone(),
                kind: Some(CompletionItemKind::REFERENCE),
                detail: Some(s.heading.clone()),
                ..Default::default()
            })
            .collect(),
        CompletionContext::None => Vec::new(),
    }
}

#[tower_lsp::async_trait]
impl HandleCompletion for Backend {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let line_idx = pos.line as usize;
        let line = doc_state.line(line_idx);
        let before_cursor: String = line.chars().take(char_index(line, pos.character)).collect();
        let document = &doc_state.parsed.document;

        // A fence inside an open snippet is a closing fence
        let inside_snippet = document
            .snippet_at_line(line_idx + 1)
            .is_some_and(|s| s.line != line_idx + 1);
        let context = match completion_context(&before_cursor) {
            CompletionContext::FenceLanguage(_) | CompletionContext::FenceLabel if inside_snippet => {
                return Ok(None);
            }
            context => context,
        };

        let registry = self.profile_registry.lock().await;
        let profile = doc_state
            .profile_name
            .as_deref()
            .and_then(|name| registry.get_profile(name));
        let completions = completion_items(&context, document, profile);

        if completions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(completions)))
        }
    }
}

#[tower_lsp::async_trait]
impl HandleDefinition for Backend {
    async fn handle_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        let tdpp = params.text_document_position_params;
        let uri = tdpp.text_document.uri;
        let pos = tdpp.position;

        let target = {
            let docs = self.documents.lock().await;
            let doc_state = match docs.get(&uri) {
                Some(state) => state,
                None => return Ok(None),
            };

            let line_idx = pos.line as usize;
            let char_idx = char_index(doc_state.line(line_idx), pos.character);
            let Some(link) = doc_state.link_at(line_idx, char_idx) else {
                return Ok(None);
            };

            match link.classify() {
                LinkTarget::Anchor(anchor) => {
                    let location = doc_state
                        .parsed
                        .document
                        .section_by_anchor(anchor)
                        .map(|section| heading_location(uri.clone(), section.line));
                    return Ok(location.map(GotoDefinitionResponse::Scalar));
                }
                LinkTarget::Document { path, anchor } => LinkedTarget::new(&uri, path, anchor),
                LinkTarget::External => None,
            }
        };

        let Some(target) = target else {
            return Ok(None);
        };
        let Ok(target_uri) = Url::from_file_path(target.dir.join(&target.path)) else {
            return Ok(None);
        };
        let Some(linked) = read_linked_document(&target.dir, &target.path).await else {
            return Ok(None);
        };
        let line = target
            .anchor
            .as_deref()
            .and_then(|anchor| linked.section_by_anchor(anchor))
            .map(|s| s.line)
            .unwrap_or(1);

        Ok(Some(GotoDefinitionResponse::Scalar(heading_location(target_uri, line))))
    }
}

fn heading_location(uri: Url, line: usize) -> Location {
    let pos = Position::new(line.saturating_sub(1) as u32, 0);
    Location::new(uri, Range::new(pos, pos))
}

#[tower_lsp::async_trait]
impl HandleDiagnostics for Backend {
    /// Create a new document state, detecting the profile from a modeline
    async fn create_document_state(&self, uri: &Url, content: String) -> DocumentState {
        let registry = self.profile_registry.lock().await;

        let profile_name = registry
            .detect_modeline_profile(&content)
            .or_else(|| registry.get_active_profile().map(|p| p.name.clone()));
        drop(registry);

        DocumentState::new(uri.path(), content, profile_name)
    }

    /// Publish diagnostics for a document
    async fn publish_diagnostics(&self, uri: Url) {
        let (parsed, content, profile_name) = {
            let docs = self.documents.lock().await;
            match docs.get(&uri) {
                Some(state) => (state.parsed.clone(), state.content.clone(), state.profile_name.clone()),
                None => return,
            }
        };

        // Linked files are read without holding any lock
        let resolver = match document_dir(&uri) {
            Some(dir) => Some(FileSystemResolver::load(&dir, &parsed.document).await),
            None => None,
        };

        let diagnostics = {
            let registry = self.profile_registry.lock().await;
            let profile = profile_name.as_deref().and_then(|name| registry.get_profile(name));

            let mut ctx = LintContext::new(profile);
            if let Some(resolver) = &resolver {
                ctx = ctx.with_resolver(resolver);
            }

            let result = lint_document(&parsed, &ctx, &self.rules);
            let lines: Vec<&str> = content.lines().collect();
            result
                .diagnostics
                .into_iter()
                .map(|d| to_lsp_diagnostic(d, &lines))
                .collect::<Vec<_>>()
        };

        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

/// Convert a lint diagnostic to its LSP form
pub fn to_lsp_diagnostic(
    diagnostic: crate::validation::Diagnostic,
    lines: &[&str],
) -> tower_lsp::lsp_types::Diagnostic {
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };

    let line_idx = diagnostic.line.saturating_sub(1);
    let line = lines.get(line_idx).copied().unwrap_or("");
    let start = utf16_col(line, diagnostic.column);
    let end = if diagnostic.length == 0 {
        utf16_len(line).max(start)
    } else {
        utf16_col(line, diagnostic.column + diagnostic.length)
    };

    tower_lsp::lsp_types::Diagnostic::new(
        Range::new(
            Position::new(line_idx as u32, start),
            Position::new(line_idx as u32, end),
        ),
        Some(severity),
        Some(NumberOrString::String(diagnostic.rule)),
        Some("docs-ls".to_string()),
        diagnostic.message,
        None,
        None,
    )
}

#[tower_lsp::async_trait]
impl HandleDocumentSymbol for Backend {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let symbols = build_symbols(&doc_state.parsed.document, &doc_state.content);
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

fn line_range(lines: &[&str], first: usize, last: usize) -> Range {
    let first_idx = first.saturating_sub(1);
    let last_idx = last.saturating_sub(1).max(first_idx);
    let end_len = lines.get(last_idx).map_or(0, |l| utf16_len(l));
    Range::new(
        Position::new(first_idx as u32, 0),
        Position::new(last_idx as u32, end_len),
    )
}

#[allow(deprecated)]
fn snippet_symbol(snippet: &Snippet, lines: &[&str], line_count: usize) -> DocumentSymbol {
    let name = match snippet.language.as_str() {
        "" => format!("{} snippet", snippet.label),
        lang => format!("{} ({})", lang, snippet.label),
    };
    DocumentSymbol {
        name,
        detail: Some(format!("{} lines", snippet.text.lines().count())),
        kind: SymbolKind::OBJECT,
        tags: None,
        deprecated: Some(false), // Required by tower-lsp 0.20
        range: line_range(lines, snippet.line, snippet.end_line.unwrap_or(line_count)),
        selection_range: line_range(lines, snippet.line, snippet.line),
        children: None,
    }
}

#[allow(deprecated)]
fn section_symbol(section: &Section, lines: &[&str], children: Vec<DocumentSymbol>) -> DocumentSymbol {
    let heading = if section.heading.is_empty() {
        "(empty heading)".to_string()
    } else {
        section.heading.clone()
    };
    DocumentSymbol {
        name: heading,
        detail: Some(format!("#{}", section.anchor)),
        kind: if section.level == 1 {
            SymbolKind::MODULE
        } else {
            SymbolKind::NAMESPACE
        },
        tags: None,
        deprecated: Some(false),
        range: line_range(lines, section.line, section.end_line),
        selection_range: line_range(lines, section.line, section.line),
        children: Some(children),
    }
}

/// Attach a finished symbol to its parent, growing the parent's range over it
fn attach(stack: &mut [(u8, DocumentSymbol)], roots: &mut Vec<DocumentSymbol>, symbol: DocumentSymbol) {
    match stack.last_mut() {
        Some((_, parent)) => {
            if symbol.range.end > parent.range.end {
                parent.range.end = symbol.range.end;
            }
            parent.children.get_or_insert_with(Vec::new).push(symbol);
        }
        None => roots.push(symbol),
    }
}

/// Section outline: headings nest by level, snippets are leaf children
pub fn build_symbols(document: &Document, content: &str) -> Vec<DocumentSymbol> {
    let lines: Vec<&str> = content.lines().collect();
    let mut roots = Vec::new();
    let mut stack: Vec<(u8, DocumentSymbol)> = Vec::new();

    for section in &document.sections {
        let snippets: Vec<DocumentSymbol> = section
            .snippets
            .iter()
            .map(|s| snippet_symbol(s, &lines, document.line_count))
            .collect();

        if section.is_preamble() {
            roots.extend(snippets);
            continue;
        }

        while stack.last().is_some_and(|(level, _)| *level >= section.level) {
            if let Some((_, finished)) = stack.pop() {
                attach(&mut stack, &mut roots, finished);
            }
        }
        stack.push((section.level, section_symbol(section, &lines, snippets)));
    }

    while let Some((_, finished)) = stack.pop() {
        attach(&mut stack, &mut roots, finished);
    }

    roots
}
