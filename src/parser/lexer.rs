//! Markdown Line Lexer
//!
//! Line-oriented classification of markdown text.
//! Focus: find headings and fences quickly; prose is left untouched.

/// Kind of a single markdown line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// Empty or whitespace-only line
    Blank,
    /// ATX heading like "## Converting reducers"
    Heading { level: u8, text: String },
    /// Fence marker line (opening or closing, decided by the `Lexer`)
    Fence(FenceMarker),
    /// Setext underline ("===" or "---")
    SetextUnderline { level: u8 },
    /// Anything else
    Text,
}

/// A fence marker like "```ts before" or "~~~~"
#[derive(Debug, Clone, PartialEq)]
pub struct FenceMarker {
    /// Either '`' or '~'
    pub ch: char,
    /// Number of marker characters (at least 3)
    pub len: usize,
    /// Info string after the marker, trimmed
    pub info: String,
}

impl FenceMarker {
    /// Whether this marker can close a fence opened by `opener`
    pub fn closes(&self, opener: &FenceMarker) -> bool {
        self.ch == opener.ch && self.len >= opener.len && self.info.is_empty()
    }

    /// The literal marker text, e.g. "```"
    pub fn marker(&self) -> String {
        std::iter::repeat_n(self.ch, self.len).collect()
    }
}

/// A classified line as seen by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Blank,
    Heading { level: u8, text: String },
    SetextUnderline { level: u8, raw: &'a str },
    FenceOpen(FenceMarker),
    FenceClose,
    /// A line inside a fence, kept verbatim
    FenceContent(&'a str),
    Text(&'a str),
}

/// Classify a single line without any context
pub fn tokenize_line(line: &str) -> LineKind {
    let trimmed_end = line.trim_end_matches(['\r', '\n']);
    if trimmed_end.trim().is_empty() {
        return LineKind::Blank;
    }

    let indent = trimmed_end.len() - trimmed_end.trim_start_matches(' ').len();
    if indent > 3 {
        return LineKind::Text;
    }
    let rest = &trimmed_end[indent..];

    if let Some(marker) = parse_fence(rest) {
        return LineKind::Fence(marker);
    }

    if let Some((level, text)) = parse_atx_heading(rest) {
        return LineKind::Heading { level, text };
    }

    if let Some(level) = parse_setext_underline(rest) {
        return LineKind::SetextUnderline { level };
    }

    LineKind::Text
}

fn parse_fence(rest: &str) -> Option<FenceMarker> {
    let ch = rest.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }

    let len = rest.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim().to_string();
    // Backtick fences may not carry backticks in their info string
    if ch == '`' && info.contains('`') {
        return None;
    }

    Some(FenceMarker { ch, len, info })
}

fn parse_atx_heading(rest: &str) -> Option<(u8, String)> {
    let level = rest.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut text = after.trim();
    // Optional closing sequence: "## Title ##"
    let without_closing = text.trim_end_matches('#');
    if without_closing.len() != text.len()
        && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
    {
        text = without_closing.trim_end();
    }

    Some((level as u8, text.to_string()))
}

fn parse_setext_underline(rest: &str) -> Option<u8> {
    let body = rest.trim_end();
    let first = body.chars().next()?;
    if (first == '=' || first == '-') && body.chars().all(|c| c == first) {
        Some(if first == '=' { 1 } else { 2 })
    } else {
        None
    }
}

/// Kind of a list item bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// Split a list item line into its kind and item text
///
/// Bullets are `-`, `*`, `+`, or a number followed by `.` or `)`, then a space.
pub fn list_item(line: &str) -> Option<(ListKind, &str)> {
    let trimmed = line.trim_start();
    for bullet in ["- ", "* ", "+ "] {
        if let Some(item) = trimmed.strip_prefix(bullet) {
            return Some((ListKind::Unordered, item));
        }
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some((ListKind::Ordered, item));
        }
    }
    None
}

/// Whether a line continues the previous list item
pub fn is_indented(line: &str) -> bool {
    line.starts_with([' ', '\t'])
}

/// Stateful lexer that tracks whether the current line is inside a fence
pub struct Lexer<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    open_fence: Option<(usize, FenceMarker)>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            open_fence: None,
        }
    }

    /// The fence still open at the current position, with its 1-based line
    pub fn open_fence(&self) -> Option<&(usize, FenceMarker)> {
        self.open_fence.as_ref()
    }
}

impl<'a> Iterator for Lexer<'a> {
    /// 1-based line number and token
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, line) = self.lines.next()?;
        let line_num = idx + 1;

        if let Some((_, opener)) = &self.open_fence {
            let token = match tokenize_line(line) {
                LineKind::Fence(marker) if marker.closes(opener) => {
                    self.open_fence = None;
                    Token::FenceClose
                }
                _ => Token::FenceContent(line),
            };
            return Some((line_num, token));
        }

        let token = match tokenize_line(line) {
            LineKind::Blank => Token::Blank,
            LineKind::Heading { level, text } => Token::Heading { level, text },
            LineKind::Fence(marker) => {
                self.open_fence = Some((line_num, marker.clone()));
                Token::FenceOpen(marker)
            }
            LineKind::SetextUnderline { level } => Token::SetextUnderline { level, raw: line },
            LineKind::Text => Token::Text(line),
        };

        Some((line_num, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_atx_heading() {
        assert_eq!(
            tokenize_line("## Typing connected components"),
            LineKind::Heading {
                level: 2,
                text: "Typing connected components".to_string()
            }
        );
        assert_eq!(
            tokenize_line("# Title ##"),
            LineKind::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
        assert_eq!(tokenize_line("#hashtag"), LineKind::Text);
        assert_eq!(tokenize_line("####### seven"), LineKind::Text);
    }

    #[test]
    fn test_tokenize_empty_heading() {
        assert_eq!(
            tokenize_line("#"),
            LineKind::Heading {
                level: 1,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_tokenize_fence() {
        match tokenize_line("```ts before") {
            LineKind::Fence(marker) => {
                assert_eq!(marker.ch, '`');
                assert_eq!(marker.len, 3);
                assert_eq!(marker.info, "ts before");
            }
            other => panic!("Expected fence, got {:?}", other),
        }

        match tokenize_line("  ~~~~") {
            LineKind::Fence(marker) => {
                assert_eq!(marker.ch, '~');
                assert_eq!(marker.len, 4);
                assert!(marker.info.is_empty());
            }
            other => panic!("Expected fence, got {:?}", other),
        }

        assert_eq!(tokenize_line("``not a fence"), LineKind::Text);
        assert_eq!(tokenize_line("    ```"), LineKind::Text);
    }

    #[test]
    fn test_tokenize_setext_and_blank() {
        assert_eq!(
            tokenize_line("====="),
            LineKind::SetextUnderline { level: 1 }
        );
        assert_eq!(tokenize_line("---"), LineKind::SetextUnderline { level: 2 });
        assert_eq!(tokenize_line("   \t"), LineKind::Blank);
    }

    #[test]
    fn test_list_items() {
        assert_eq!(list_item("- install tsc"), Some((ListKind::Unordered, "install tsc")));
        assert_eq!(list_item("  * nested"), Some((ListKind::Unordered, "nested")));
        assert_eq!(list_item("12) twelfth"), Some((ListKind::Ordered, "twelfth")));
        assert_eq!(list_item("3. third"), Some((ListKind::Ordered, "third")));
        assert_eq!(list_item("-not a bullet"), None);
        assert_eq!(list_item("2024 was a year"), None);
        assert!(is_indented("  continued"));
        assert!(!is_indented("continued"));
    }

    #[test]
    fn test_closing_fence_rules() {
        let opener = FenceMarker {
            ch: '`',
            len: 4,
            info: "ts".to_string(),
        };
        let short = FenceMarker {
            ch: '`',
            len: 3,
            info: String::new(),
        };
        let tilde = FenceMarker {
            ch: '~',
            len: 4,
            info: String::new(),
        };
        let long = FenceMarker {
            ch: '`',
            len: 5,
            info: String::new(),
        };
        assert!(!short.closes(&opener));
        assert!(!tilde.closes(&opener));
        assert!(long.closes(&opener));
    }

    #[test]
    fn test_lexer_tracks_fence_state() {
        let text = "# Title\n```ts\n# not a heading\n```\ntext";
        let tokens: Vec<_> = Lexer::new(text).collect();

        assert_eq!(tokens.len(), 5);
        assert!(matches!(tokens[0].1, Token::Heading { level: 1, .. }));
        assert!(matches!(tokens[1].1, Token::FenceOpen(_)));
        assert_eq!(tokens[2].1, Token::FenceContent("# not a heading"));
        assert_eq!(tokens[3].1, Token::FenceClose);
        assert_eq!(tokens[4], (5, Token::Text("text")));
    }

    #[test]
    fn test_lexer_reports_open_fence() {
        let mut lexer = Lexer::new("intro\n```js\nconst a = 1;");
        while lexer.next().is_some() {}
        let (line, marker) = lexer.open_fence().expect("fence left open");
        assert_eq!(*line, 2);
        assert_eq!(marker.info, "js");
    }
}
