//! Profile Schema Types
//!
//! A profile is the reference toolchain configuration for snippets:
//! which languages are known and how each one is checked.

use serde::Deserialize;
use std::collections::HashMap;

use crate::snippet::SnippetLabel;

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileFile {
    pub profile: ProfileMeta,
    #[serde(default)]
    pub languages: Vec<LanguageDef>,
    pub labels: Option<LabelSettings>,
}

/// Profile metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileMeta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Which snippet labels a profile accepts
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LabelSettings {
    pub allowed: Vec<String>,
}

/// A snippet language known to a profile
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LanguageDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// File extension used when the snippet is written to disk
    pub extension: Option<String>,
    pub description: Option<String>,
    /// Toolchain argv; `{file}` is replaced with the snippet path
    pub command: Option<Vec<String>>,
    /// In-process checker used instead of a command
    pub builtin: Option<BuiltinChecker>,
}

/// Checkers that run without an external toolchain
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinChecker {
    Json,
    Toml,
}

/// Runtime profile (optimized for lookups)
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Keyed by lowercase language name
    pub languages: HashMap<String, LanguageDef>,
    /// Lowercase alias -> lowercase language name
    aliases: HashMap<String, String>,
    /// Lowercase allowed labels; `None` means the built-in set
    allowed_labels: Option<Vec<String>>,
}

impl From<ProfileFile> for Profile {
    fn from(file: ProfileFile) -> Self {
        let mut languages = HashMap::new();
        let mut aliases = HashMap::new();

        for lang in file.languages {
            let key = lang.name.to_lowercase();
            for alias in &lang.aliases {
                aliases.insert(alias.to_lowercase(), key.clone());
            }
            languages.insert(key, lang);
        }

        Self {
            name: file.profile.name,
            version: file.profile.version,
            description: file.profile.description,
            languages,
            aliases,
            allowed_labels: file
                .labels
                .map(|l| l.allowed.iter().map(|a| a.to_lowercase()).collect()),
        }
    }
}

impl Profile {
    /// Find a language by name or alias (case-insensitive)
    pub fn language(&self, name: &str) -> Option<&LanguageDef> {
        let key = name.to_lowercase();
        self.languages.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|canonical| self.languages.get(canonical))
        })
    }

    /// Whether a label may be used in documents checked with this profile
    pub fn allows_label(&self, label: &SnippetLabel) -> bool {
        match label {
            SnippetLabel::Unlabelled => true,
            other => match &self.allowed_labels {
                Some(allowed) => allowed.iter().any(|a| a == &other.as_str().to_lowercase()),
                None => other.is_builtin(),
            },
        }
    }

    /// Labels offered for completion
    pub fn label_names(&self) -> Vec<String> {
        match &self.allowed_labels {
            Some(allowed) => allowed.clone(),
            None => SnippetLabel::BUILTIN.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Language names and aliases, sorted
    pub fn language_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .languages
            .values()
            .map(|l| l.name.as_str())
            .chain(self.languages.values().flat_map(|l| l.aliases.iter().map(String::as_str)))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl LanguageDef {
    /// Whether snippets in this language can be validated at all
    pub fn is_checkable(&self) -> bool {
        self.builtin.is_some() || self.command.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Extension for temporary snippet files
    pub fn file_extension(&self) -> &str {
        self.extension.as_deref().unwrap_or("txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Profile {
        let file: ProfileFile = toml::from_str(
            r#"
[profile]
name = "frontend"

[[languages]]
name = "TypeScript"
aliases = ["ts"]
extension = "ts"
command = ["tsc", "--noEmit", "{file}"]

[[languages]]
name = "json"
builtin = "json"

[[languages]]
name = "sh"

[labels]
allowed = ["before", "after", "Legacy"]
"#,
        )
        .expect("valid profile");
        Profile::from(file)
    }

    #[test]
    fn test_language_lookup_by_alias() {
        let profile = sample();
        assert_eq!(profile.language("ts").map(|l| l.name.as_str()), Some("TypeScript"));
        assert_eq!(profile.language("TYPESCRIPT").map(|l| l.name.as_str()), Some("TypeScript"));
        assert!(profile.language("python").is_none());
    }

    #[test]
    fn test_checkable_languages() {
        let profile = sample();
        assert!(profile.language("ts").unwrap().is_checkable());
        assert_eq!(profile.language("json").unwrap().builtin, Some(BuiltinChecker::Json));
        assert!(!profile.language("sh").unwrap().is_checkable());
        assert_eq!(profile.language("sh").unwrap().file_extension(), "txt");
    }

    #[test]
    fn test_allowed_labels() {
        let profile = sample();
        assert!(profile.allows_label(&SnippetLabel::Before));
        assert!(profile.allows_label(&SnippetLabel::Unlabelled));
        assert!(profile.allows_label(&SnippetLabel::Other("legacy".to_string())));
        assert!(!profile.allows_label(&SnippetLabel::Good));
    }

    #[test]
    fn test_default_labels_when_unset() {
        let file: ProfileFile = toml::from_str("[profile]\nname = \"bare\"\n").expect("valid");
        let profile = Profile::from(file);
        assert!(profile.allows_label(&SnippetLabel::Good));
        assert!(!profile.allows_label(&SnippetLabel::Other("meh".to_string())));
        assert_eq!(profile.label_names().len(), 5);
    }

    #[test]
    fn test_language_names_include_aliases() {
        let profile = sample();
        let names = profile.language_names();
        assert!(names.contains(&"ts"));
        assert!(names.contains(&"TypeScript"));
    }
}
