//! Rendering a loaded store to disk
use std::fs;

use docs_language_server::core::ContentStore;
use docs_language_server::render::{render_store, RenderFormat};

fn sample_store() -> (tempfile::TempDir, ContentStore) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guides")).unwrap();
    fs::write(
        dir.path().join("handbook.md"),
        "# Handbook\n\nStart with [setup](guides/setup.md#installing).\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("guides/setup.md"),
        "# Setup <fast>\n\n## Installing\n\n```ts before\nif (a < b) {}\n```\n\n```ts after\nif (a <= b) {}\n```\n",
    )
    .unwrap();
    let store = ContentStore::load(&[dir.path()]).unwrap();
    (dir, store)
}

#[test]
fn test_render_html_site() {
    let (_docs, store) = sample_store();
    let out = tempfile::tempdir().unwrap();

    let written = render_store(&store, RenderFormat::Html, out.path()).unwrap();
    assert_eq!(written.len(), 3);

    let index = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains("<title>Index</title>"));
    assert!(index.contains("<a href=\"guides/setup.html\">Setup &lt;fast&gt;</a>"));
    assert!(index.contains("<a href=\"handbook.html\">Handbook</a>"));

    let handbook = fs::read_to_string(out.path().join("handbook.html")).unwrap();
    assert!(handbook.contains("href=\"guides/setup.html#installing\""));

    let setup = fs::read_to_string(out.path().join("guides/setup.html")).unwrap();
    assert!(setup.contains("<title>Setup &lt;fast&gt;</title>"));
    assert!(setup.contains("<a href=\"../index.html\">Index</a>"));
    assert!(setup.contains("<h2 id=\"installing\">Installing</h2>"));
    assert!(setup.contains(
        "<pre class=\"snippet snippet-before\" data-language=\"ts\"><code>if (a &lt; b) {}</code></pre>"
    ));
    assert!(setup.contains("snippet-after"));
}

#[test]
fn test_index_document_is_the_landing_page() {
    let store = ContentStore::from_sources(
        "",
        vec![
            ("index.md".to_string(), "# Welcome\n".to_string()),
            ("other.md".to_string(), "# Other\n".to_string()),
        ],
    );
    let out = tempfile::tempdir().unwrap();

    let written = render_store(&store, RenderFormat::Html, out.path()).unwrap();
    assert_eq!(written.len(), 2);

    let index = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains("<title>Welcome</title>"));
}

#[test]
fn test_render_toc_and_json() {
    let (_docs, store) = sample_store();
    let out = tempfile::tempdir().unwrap();

    let written = render_store(&store, RenderFormat::Toc, out.path()).unwrap();
    assert_eq!(written, vec![out.path().join("toc.md")]);
    let toc = fs::read_to_string(out.path().join("toc.md")).unwrap();
    assert!(toc.starts_with("# Table of contents\n"));
    assert!(toc.contains("- [Setup <fast>](guides/setup.md)\n  - [Installing](guides/setup.md#installing)\n"));

    render_store(&store, RenderFormat::Json, out.path()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("docs.json")).unwrap()).unwrap();
    let documents = json["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["name"], "guides/setup.md");
}
