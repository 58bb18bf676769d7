//! Content Store
//!
//! An ordered, read-only collection of parsed documents loaded from disk
//! or built in memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::parser::{classify_target, parse_document, Document, LinkTarget, ParsedDocument};

/// Outcome of resolving a raw link target against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkResolution {
    /// Not an internal link; nothing to check
    External,
    Resolved,
    /// Store-relative name of the document that was looked for
    MissingDocument(String),
    MissingAnchor { document: String, anchor: String },
}

/// Outcome of resolving a link to another document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentResolution {
    Resolved,
    MissingDocument(String),
    MissingAnchor { document: String, anchor: String },
}

impl From<DocumentResolution> for LinkResolution {
    fn from(resolution: DocumentResolution) -> Self {
        match resolution {
            DocumentResolution::Resolved => LinkResolution::Resolved,
            DocumentResolution::MissingDocument(name) => LinkResolution::MissingDocument(name),
            DocumentResolution::MissingAnchor { document, anchor } => {
                LinkResolution::MissingAnchor { document, anchor }
            }
        }
    }
}

/// Resolves links that point at other documents
pub trait LinkResolver {
    /// Resolve `path` (and optional anchor) relative to the document `from`
    fn resolve(&self, from: &str, path: &str, anchor: Option<&str>) -> DocumentResolution;
}

/// A parsed document together with where it came from
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Store-relative name using `/` separators
    pub name: String,
    /// Location on disk; empty for in-memory sources
    pub path: PathBuf,
    pub text: String,
    pub parsed: ParsedDocument,
}

impl StoredDocument {
    pub fn document(&self) -> &Document {
        &self.parsed.document
    }
}

/// Ordered collection of documents
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    root: PathBuf,
    documents: Vec<StoredDocument>,
    index: HashMap<String, usize>,
}

impl ContentStore {
    /// Load every markdown file under the given paths
    ///
    /// Directories are walked recursively, files are taken as-is. Document
    /// names are relative to the path they were found under.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut store = Self::default();

        for input in paths {
            let input = input.as_ref();
            let (base, files) = if input.is_dir() {
                (input.to_path_buf(), find_markdown_files(input))
            } else if input.is_file() {
                let base = input.parent().map(Path::to_path_buf).unwrap_or_default();
                (base, vec![input.to_path_buf()])
            } else {
                anyhow::bail!("Input path does not exist: {}", input.display());
            };

            if store.root.as_os_str().is_empty() {
                store.root = base.clone();
            }

            log::debug!("Found {} markdown files under {}", files.len(), input.display());

            for file in files {
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let name = relative_name(&base, &file);
                store.insert(name, file, text);
            }
        }

        log::info!("Loaded {} documents", store.documents.len());
        Ok(store)
    }

    /// Build a store from in-memory `(name, text)` pairs
    pub fn from_sources(root: impl Into<PathBuf>, sources: Vec<(String, String)>) -> Self {
        let mut store = Self {
            root: root.into(),
            ..Self::default()
        };
        for (name, text) in sources {
            store.insert(name, PathBuf::new(), text);
        }
        store
    }

    fn insert(&mut self, name: String, path: PathBuf, text: String) {
        if self.index.contains_key(&name) {
            log::warn!("Skipping {}: a document named '{}' is already loaded", path.display(), name);
            return;
        }
        let parsed = parse_document(&name, &text);
        self.index.insert(name.clone(), self.documents.len());
        self.documents.push(StoredDocument {
            name,
            path,
            text,
            parsed,
        });
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&StoredDocument> {
        self.index.get(name).map(|&i| &self.documents[i])
    }

    /// Documents in load order
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Anchor slugs of a document, in document order
    pub fn anchors_of(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name).map(|doc| {
            doc.document()
                .headed_sections()
                .map(|s| s.anchor.as_str())
                .collect()
        })
    }

    /// Resolve a raw link target as written in the document `from`
    pub fn resolve_link(&self, from: &str, target: &str) -> LinkResolution {
        match classify_target(target) {
            LinkTarget::External => LinkResolution::External,
            LinkTarget::Anchor(anchor) => match self.get(from) {
                Some(doc) if anchor.is_empty() || doc.document().has_anchor(anchor) => {
                    LinkResolution::Resolved
                }
                Some(_) => LinkResolution::MissingAnchor {
                    document: from.to_string(),
                    anchor: anchor.to_string(),
                },
                None => LinkResolution::MissingDocument(from.to_string()),
            },
            LinkTarget::Document { path, anchor } => self.resolve(from, path, anchor).into(),
        }
    }
}

impl LinkResolver for ContentStore {
    fn resolve(&self, from: &str, path: &str, anchor: Option<&str>) -> DocumentResolution {
        let Some(name) = join_relative(from, path) else {
            return DocumentResolution::MissingDocument(path.to_string());
        };
        let Some(doc) = self.get(&name) else {
            return DocumentResolution::MissingDocument(name);
        };
        check_anchor(doc.document(), name, anchor)
    }
}

fn check_anchor(doc: &Document, name: String, anchor: Option<&str>) -> DocumentResolution {
    match anchor {
        Some(anchor) if !anchor.is_empty() && !doc.has_anchor(anchor) => {
            DocumentResolution::MissingAnchor {
                document: name,
                anchor: anchor.to_string(),
            }
        }
        _ => DocumentResolution::Resolved,
    }
}

/// Read and parse a document linked as `path` from a document in `dir`
pub async fn read_linked_document(dir: &Path, path: &str) -> Option<Document> {
    let text = tokio::fs::read_to_string(dir.join(path)).await.ok()?;
    Some(parse_document(path, &text).document)
}

/// Resolves links against files on disk next to the linking document
///
/// Used by the language server, which only holds open buffers in memory.
/// Linked files are read once up front so resolving never touches the disk.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver {
    documents: HashMap<String, Option<Document>>,
}

impl FileSystemResolver {
    /// Read every document that `document` links to, relative to `dir`
    pub async fn load(dir: &Path, document: &Document) -> Self {
        let mut documents = HashMap::new();
        for link in document.links() {
            let LinkTarget::Document { path, .. } = link.classify() else {
                continue;
            };
            if documents.contains_key(path) {
                continue;
            }
            let linked = read_linked_document(dir, path).await;
            documents.insert(path.to_string(), linked);
        }
        log::debug!("Loaded {} linked documents from {}", documents.len(), dir.display());
        Self { documents }
    }
}

impl LinkResolver for FileSystemResolver {
    fn resolve(&self, _from: &str, path: &str, anchor: Option<&str>) -> DocumentResolution {
        match self.documents.get(path) {
            Some(Some(doc)) => check_anchor(doc, path.to_string(), anchor),
            _ => DocumentResolution::MissingDocument(path.to_string()),
        }
    }
}

fn find_markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && is_markdown(path))
        .collect();
    files.sort();
    files
}

pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

fn relative_name(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a link path onto the directory of `from`, normalizing `.` and `..`
///
/// A leading `/` is taken relative to the store root. Returns `None` when the
/// path climbs out of the root.
fn join_relative(from: &str, path: &str) -> Option<String> {
    let mut parts: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        let mut dir: Vec<&str> = from.split('/').collect();
        dir.pop();
        dir
    };

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    Some(parts.join("/"))
}
