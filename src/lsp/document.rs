use crate::parser::{parse_document, Link, ParsedDocument};

/// State for each open document
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    pub parsed: ParsedDocument,
    /// Detected from modeline or the active profile
    pub profile_name: Option<String>,
}

impl DocumentState {
    pub fn new(name: &str, content: String, profile_name: Option<String>) -> Self {
        let parsed = parse_document(name, &content);
        Self {
            content,
            parsed,
            profile_name,
        }
    }

    /// Text of a 0-based line
    pub fn line(&self, line_idx: usize) -> &str {
        self.content.lines().nth(line_idx).unwrap_or("")
    }

    /// Link under a 0-based line and character column
    pub fn link_at(&self, line_idx: usize, char_idx: usize) -> Option<&Link> {
        self.parsed.document.links().find(|link| {
            link.line == line_idx + 1 && char_idx >= link.column && char_idx < link.column + link.length
        })
    }
}

/// Convert an LSP UTF-16 column into a character index
pub fn char_index(line: &str, utf16_col: u32) -> usize {
    let mut units = 0u32;
    for (idx, ch) in line.chars().enumerate() {
        if units >= utf16_col {
            return idx;
        }
        units += ch.len_utf16() as u32;
    }
    line.chars().count()
}

/// Convert a character index into an LSP UTF-16 column
pub fn utf16_col(line: &str, char_idx: usize) -> u32 {
    line.chars().take(char_idx).map(|c| c.len_utf16() as u32).sum()
}

/// Length of a line in UTF-16 units
pub fn utf16_len(line: &str) -> u32 {
    line.encode_utf16().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_conversions() {
        let line = "a😀b";
        assert_eq!(utf16_len(line), 4);
        assert_eq!(utf16_col(line, 2), 3);
        assert_eq!(char_index(line, 3), 2);
        assert_eq!(char_index(line, 99), 3);
    }

    #[test]
    fn test_link_at() {
        let state = DocumentState::new("a.md", "# A\nsee [here](#a) now\n".to_string(), None);
        assert!(state.link_at(1, 3).is_none());
        assert_eq!(state.link_at(1, 4).map(|l| l.target.as_str()), Some("#a"));
        assert_eq!(state.link_at(1, 13).map(|l| l.target.as_str()), Some("#a"));
        assert!(state.link_at(1, 14).is_none());
    }
}
