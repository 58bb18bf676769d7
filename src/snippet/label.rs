//! Snippet intent labels and flags parsed from fence info strings.

use std::fmt;

use serde::Serialize;

/// Declared intent of a snippet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLabel {
    Before,
    After,
    Bad,
    Good,
    Example,
    /// No label given
    Unlabelled,
    /// A label this tool does not know about
    Other(String),
}

/// Flags controlling snippet validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnippetFlags {
    /// Never validate this snippet
    pub ignore: bool,
    /// Validation passes only when the toolchain rejects the snippet
    pub fails: bool,
}

impl SnippetLabel {
    /// The built-in labels, in display order
    pub const BUILTIN: [&'static str; 5] = ["before", "after", "bad", "good", "example"];

    /// Parse a single label word (case-insensitive)
    pub fn from_word(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "before" => Self::Before,
            "after" => Self::After,
            "bad" => Self::Bad,
            "good" => Self::Good,
            "example" => Self::Example,
            "" => Self::Unlabelled,
            _ => Self::Other(word.to_string()),
        }
    }

    /// Split a fence info string into language, label and flags
    ///
    /// Accepted forms: `ts`, `ts before`, `ts label=after`, `tsx,good`,
    /// `ts {bad}`, `ts before ignore`, `ts fails`, `ts title="x.ts"`.
    pub fn parse_info(info: &str) -> (String, SnippetLabel, SnippetFlags) {
        let mut words = split_info(info)
            .into_iter()
            .map(|w| w.trim_matches(|c| c == '{' || c == '}'))
            .filter(|w| !w.is_empty());

        let language = words.next().unwrap_or_default().to_string();
        let mut label = SnippetLabel::Unlabelled;
        let mut flags = SnippetFlags::default();

        for word in words {
            let lower = word.to_ascii_lowercase();
            match lower.as_str() {
                "ignore" | "no-check" => flags.ignore = true,
                "fails" | "compile-fail" => flags.fails = true,
                _ => {
                    if let Some(value) = lower.strip_prefix("label=") {
                        label = SnippetLabel::from_word(value.trim_matches('"'));
                    } else if word.contains('=') {
                        // Other attributes (title="...") are presentation only
                        continue;
                    } else if label == SnippetLabel::Unlabelled {
                        label = SnippetLabel::from_word(word);
                    }
                }
            }
        }

        (language, label, flags)
    }

    /// The label as written in documents
    pub fn as_str(&self) -> &str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Bad => "bad",
            Self::Good => "good",
            Self::Example => "example",
            Self::Unlabelled => "",
            Self::Other(text) => text,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Split an info string on whitespace and commas outside double quotes
fn split_info(info: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (idx, c) in info.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && (c.is_whitespace() || c == ',') {
            words.push(&info[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    words.push(&info[start..]);
    words
}

impl fmt::Display for SnippetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlabelled => write!(f, "unlabelled"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_only() {
        let (lang, label, flags) = SnippetLabel::parse_info("ts");
        assert_eq!(lang, "ts");
        assert_eq!(label, SnippetLabel::Unlabelled);
        assert_eq!(flags, SnippetFlags::default());
    }

    #[test]
    fn test_parse_bare_label() {
        let (lang, label, _) = SnippetLabel::parse_info("tsx Before");
        assert_eq!(lang, "tsx");
        assert_eq!(label, SnippetLabel::Before);
    }

    #[test]
    fn test_parse_label_attribute_and_flags() {
        let (lang, label, flags) = SnippetLabel::parse_info("ts label=after ignore title=\"store.ts\"");
        assert_eq!(lang, "ts");
        assert_eq!(label, SnippetLabel::After);
        assert!(flags.ignore);
        assert!(!flags.fails);
    }

    #[test]
    fn test_parse_braced_and_comma_forms() {
        assert_eq!(SnippetLabel::parse_info("ts {bad}").1, SnippetLabel::Bad);
        assert_eq!(SnippetLabel::parse_info("ts,good,fails").1, SnippetLabel::Good);
        assert!(SnippetLabel::parse_info("ts,good,fails").2.fails);
    }

    #[test]
    fn test_parse_unknown_label_and_empty_info() {
        assert_eq!(
            SnippetLabel::parse_info("js wrong").1,
            SnippetLabel::Other("wrong".to_string())
        );
        let (lang, label, _) = SnippetLabel::parse_info("");
        assert!(lang.is_empty());
        assert_eq!(label, SnippetLabel::Unlabelled);
    }

    #[test]
    fn test_quoted_attribute_values_keep_spaces() {
        let (lang, label, flags) = SnippetLabel::parse_info("ts title=\"my store.ts\"");
        assert_eq!(lang, "ts");
        assert_eq!(label, SnippetLabel::Unlabelled);
        assert!(!flags.ignore);

        let (_, label, flags) =
            SnippetLabel::parse_info("ts title=\"before, after\" good fails");
        assert_eq!(label, SnippetLabel::Good);
        assert!(flags.fails);

        assert_eq!(
            SnippetLabel::parse_info("ts label=\"bad\"").1,
            SnippetLabel::Bad
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(SnippetLabel::Good.to_string(), "good");
        assert_eq!(SnippetLabel::Unlabelled.to_string(), "unlabelled");
    }
}
