//! Core Business Logic
//!
//! The content store and run-level diagnostic reports.

pub mod diagnostics;
pub mod store;

pub use diagnostics::{FileReport, Report};
pub use store::{
    read_linked_document, ContentStore, DocumentResolution, FileSystemResolver, LinkResolution,
    LinkResolver, StoredDocument,
};
