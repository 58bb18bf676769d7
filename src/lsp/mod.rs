//! LSP Protocol Implementation
//!
//! Outline, hover, completion, go-to-definition and live lint diagnostics
//! for guidance documents.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod server;

pub use backend::Backend;
pub use server::serve;
