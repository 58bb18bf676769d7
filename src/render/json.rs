//! JSON dump of the whole store.

use serde::Serialize;

use crate::core::ContentStore;
use crate::parser::{Document, FormatIssue};

#[derive(Serialize)]
struct StoreDump<'a> {
    root: String,
    documents: Vec<DocumentDump<'a>>,
}

#[derive(Serialize)]
struct DocumentDump<'a> {
    #[serde(flatten)]
    document: &'a Document,
    issues: &'a [FormatIssue],
}

pub fn render_json(store: &ContentStore) -> serde_json::Result<String> {
    let dump = StoreDump {
        root: store.root().display().to_string(),
        documents: store
            .documents()
            .iter()
            .map(|doc| DocumentDump {
                document: &doc.parsed.document,
                issues: &doc.parsed.issues,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&dump)
}
