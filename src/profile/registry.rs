//! Profile Registry
//!
//! In-memory registry of snippet profiles with layered loading:
//! built-in < user-global < workspace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{LanguageDef, Profile, ProfileFile};

/// Name of the profile compiled into the binary
pub const DEFAULT_PROFILE: &str = "default";

const EMBEDDED_DEFAULT: &str = include_str!("../../resources/profiles/default.docs-profile.toml");

/// Errors raised while loading profile files
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where a profile was loaded from; later sources win
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfilePriority {
    BuiltIn,
    UserGlobal,
    Workspace,
}

#[derive(Debug, Clone)]
struct LoadedProfile {
    profile: Profile,
    priority: ProfilePriority,
    source: Option<PathBuf>,
}

/// Simple in-memory profile registry
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, LoadedProfile>,
    active_profile: Option<String>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            active_profile: None,
        }
    }

    /// Registry with the embedded default profile loaded and active
    pub fn with_default_profile() -> Self {
        let mut registry = Self::new();
        registry.add_embedded_default_profile();
        registry.set_active_profile(DEFAULT_PROFILE);
        registry
    }

    /// Add a profile at workspace priority
    pub fn add_profile(&mut self, profile: Profile) {
        self.insert(profile, ProfilePriority::Workspace, None);
    }

    fn insert(&mut self, profile: Profile, priority: ProfilePriority, source: Option<PathBuf>) -> bool {
        let replace = match self.profiles.get(&profile.name) {
            Some(existing) => priority >= existing.priority,
            None => true,
        };
        if replace {
            log::debug!("registering profile '{}' ({:?})", profile.name, priority);
            self.profiles.insert(
                profile.name.clone(),
                LoadedProfile {
                    profile,
                    priority,
                    source,
                },
            );
        }
        replace
    }

    /// Set the active profile
    pub fn set_active_profile(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            self.active_profile = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Get the currently active profile
    pub fn get_active_profile(&self) -> Option<&Profile> {
        self.active_profile
            .as_ref()
            .and_then(|name| self.get_profile(name))
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name).map(|loaded| &loaded.profile)
    }

    /// Priority the named profile was loaded with
    pub fn priority_of(&self, name: &str) -> Option<ProfilePriority> {
        self.profiles.get(name).map(|loaded| loaded.priority)
    }

    /// File the named profile was loaded from (`None` for embedded profiles)
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.profiles.get(name)?.source.as_deref()
    }

    /// List all available profiles, sorted by name
    pub fn list_profiles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get a language definition from the active profile
    pub fn get_language(&self, name: &str) -> Option<&LanguageDef> {
        self.get_active_profile()?.language(name)
    }

    /// Add the default profile compiled into the binary
    pub fn add_embedded_default_profile(&mut self) {
        match toml::from_str::<ProfileFile>(EMBEDDED_DEFAULT) {
            Ok(file) => {
                self.insert(Profile::from(file), ProfilePriority::BuiltIn, None);
            }
            Err(e) => {
                log::warn!("Failed to parse embedded default profile: {}", e);
            }
        }
    }

    /// Load one profile file
    pub fn load_file(&mut self, path: &Path, priority: ProfilePriority) -> Result<String, ProfileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ProfileFile = toml::from_str(&content).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let profile = Profile::from(file);
        let name = profile.name.clone();
        if !self.insert(profile, priority, Some(path.to_path_buf())) {
            log::debug!("profile '{}' from {:?} shadowed by a higher priority source", name, path);
        }
        Ok(name)
    }

    /// Load every `*.toml` file of a directory
    ///
    /// A missing directory is not an error. Invalid files are skipped with a
    /// warning so one broken profile does not hide the others.
    pub fn load_directory(&mut self, dir: &Path, priority: ProfilePriority) -> Result<Vec<String>, ProfileError> {
        if !dir.is_dir() {
            log::debug!("profile directory {:?} does not exist", dir);
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(dir).map_err(|source| ProfileError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            match self.load_file(&path, priority) {
                Ok(name) => {
                    log::info!("Loaded profile '{}' from {:?}", name, path);
                    loaded.push(name);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        Ok(loaded)
    }

    /// Detect profile from a modeline in document content
    ///
    /// Only profiles known to the registry are returned.
    pub fn detect_modeline_profile(&self, content: &str) -> Option<String> {
        crate::parser::modeline_profile(content).filter(|name| self.profiles.contains_key(name))
    }

    /// Profile to use for a document: modeline first, then the active profile
    pub fn profile_for(&self, content: &str) -> Option<&Profile> {
        match self.detect_modeline_profile(content) {
            Some(name) => self.get_profile(&name),
            None => self.get_active_profile(),
        }
    }
}
