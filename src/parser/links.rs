//! Inline link scanning and anchor slugs.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static LINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"!?\[([^\]]*)\]\(\s*<?([^)\s>]*)>?(?:\s+"[^"]*")?\s*\)"#).ok()
});

/// An inline markdown link `[text](target)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub text: String,
    pub target: String,
    /// 1-based line
    pub line: usize,
    /// 0-based character column of the opening bracket
    pub column: usize,
    /// Length in characters of the whole link
    pub length: usize,
}

/// What kind of destination a link target points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    /// `#anchor` within the same document
    Anchor(&'a str),
    /// Relative markdown document with optional anchor
    Document {
        path: &'a str,
        anchor: Option<&'a str>,
    },
    /// URLs, mail links, images and other files
    External,
}

impl Link {
    pub fn classify(&self) -> LinkTarget<'_> {
        classify_target(&self.target)
    }

    /// Whether the link should be checked against the store
    pub fn is_internal(&self) -> bool {
        !matches!(self.classify(), LinkTarget::External)
    }
}

/// Classify a raw link target
pub fn classify_target(target: &str) -> LinkTarget<'_> {
    if let Some(anchor) = target.strip_prefix('#') {
        return LinkTarget::Anchor(anchor);
    }

    if target.is_empty() || target.starts_with("//") || has_scheme(target) {
        return LinkTarget::External;
    }

    let (path, anchor) = match target.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor)),
        None => (target, None),
    };

    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".md") || lower.ends_with(".markdown") {
        LinkTarget::Document { path, anchor }
    } else {
        LinkTarget::External
    }
}

fn has_scheme(target: &str) -> bool {
    match target.find(':') {
        Some(idx) => {
            let scheme = &target[..idx];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Scan one line of prose for inline links (images are skipped)
pub fn scan_links(line: &str, line_num: usize) -> Vec<Link> {
    let Some(re) = LINK_RE.as_ref() else {
        return Vec::new();
    };

    let without_code = mask_inline_code(line);
    re.captures_iter(&without_code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if whole.as_str().starts_with('!') {
                return None;
            }
            let start = whole.start();
            Some(Link {
                text: caps.get(1)?.as_str().to_string(),
                target: caps.get(2)?.as_str().to_string(),
                line: line_num,
                column: line[..start].chars().count(),
                length: line[start..whole.end()].chars().count(),
            })
        })
        .collect()
}

/// Replace the contents of `code spans` with spaces so links inside them are ignored.
/// Byte offsets are preserved.
fn mask_inline_code(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_code = false;
    for ch in line.chars() {
        if ch == '`' {
            in_code = !in_code;
            out.push(ch);
        } else if in_code {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Compute the anchor slug of a heading
pub fn slugify(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// Hands out unique slugs in document order ("intro", "intro-1", ...)
#[derive(Debug, Default)]
pub struct SlugAllocator {
    seen: HashMap<String, usize>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique slug and whether the base slug was already taken
    pub fn allocate(&mut self, heading: &str) -> (String, bool) {
        let base = slugify(heading);
        let Some(&previous) = self.seen.get(&base) else {
            self.seen.insert(base.clone(), 0);
            return (base, false);
        };

        let mut count = previous;
        let unique = loop {
            count += 1;
            let candidate = format!("{}-{}", base, count);
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };
        self.seen.insert(base, count);
        self.seen.insert(unique.clone(), 0);
        (unique, true)
    }
}
