//! Docs Language Server
//!
//! Tooling for guidance documents: Markdown pages whose fenced code
//! snippets are labelled (`before`, `after`, ...) and checked against a
//! snippet profile.
//!
//! This library provides:
//! - Document parsing into sections, snippets and links
//! - A content store with cross-document link resolution
//! - Snippet extraction and toolchain validation
//! - Presentation lints
//! - HTML, table-of-contents and JSON rendering
//! - An LSP server and the `docs-ls` command-line tool

pub mod commands;
pub mod config;
pub mod core;
pub mod lsp;
pub mod parser;
pub mod profile;
pub mod render;
pub mod snippet;
pub mod validation;
pub mod watch;

// Re-exports for clean public API
pub use config::Config;
pub use core::{ContentStore, Report};
pub use parser::{parse_document, Document, ParsedDocument};
pub use profile::{Profile, ProfileRegistry};
pub use snippet::{extract_snippets, SnippetLabel};
pub use validation::{validate_document, Diagnostic, SnippetValidator};
