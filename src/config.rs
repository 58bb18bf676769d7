//! Configuration management for the docs language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Project configuration (`.docs-ls.toml`) discovery
//! - Profile directory layering

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::profile::{ProfilePriority, ProfileRegistry, DEFAULT_PROFILE};
use crate::render::RenderFormat;
use crate::validation::DEFAULT_SNIPPET_TIMEOUT;

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = ".docs-ls.toml";

/// Command-line arguments for the docs language server
#[derive(Debug, Parser)]
#[command(name = "docs-ls")]
#[command(about = "Language server and checker for guidance documents with code snippets")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Explicitly specify the snippet profile to use
    #[arg(long, global = true, help = "Snippet profile to use (e.g., 'default')")]
    pub profile: Option<String>,

    /// Custom profile directory to search for profile files
    #[arg(long, global = true, help = "Directory containing profile TOML files")]
    pub profile_dir: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the language server over stdio (the default)
    Serve,
    /// Lint documents and optionally validate their snippets
    Check(CheckArgs),
    /// Print the labelled snippets of a document
    Extract(ExtractArgs),
    /// Render documents as HTML, a table of contents or JSON
    Render(RenderArgs),
    /// Re-check documents whenever they change
    Watch(WatchArgs),
    /// List the known snippet profiles
    Profiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CheckArgs {
    /// Documents or directories (defaults to `docs` from the project config)
    pub paths: Vec<PathBuf>,

    /// Also compile snippets with the profile's toolchain
    #[arg(long)]
    pub validate_snippets: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show info diagnostics and clean files
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ExtractArgs {
    pub path: PathBuf,

    /// Only snippets with this label
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RenderArgs {
    pub paths: Vec<PathBuf>,

    /// Output directory
    #[arg(long, short)]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = RenderFormat::Html)]
    pub format: RenderFormat,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct WatchArgs {
    pub paths: Vec<PathBuf>,

    #[arg(long)]
    pub validate_snippets: bool,
}

/// Contents of `.docs-ls.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub profile: Option<String>,
    pub profile_dir: Option<PathBuf>,
    pub docs: Vec<PathBuf>,
    pub disabled_rules: Vec<String>,
    pub snippet_timeout_secs: Option<u64>,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid project config {}", path.display()))
    }

    /// Find the nearest `.docs-ls.toml` in `start` or its ancestors
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Profile name explicitly set via command line
    pub cli_profile: Option<String>,
    /// Profile name from the project config
    pub project_profile: Option<String>,
    /// Profile directories in increasing priority
    pub profile_dirs: Vec<(PathBuf, ProfilePriority)>,
    /// Document paths from the project config, resolved against its directory
    pub docs: Vec<PathBuf>,
    pub disabled_rules: Vec<String>,
    pub snippet_timeout: Duration,
    pub log_level: String,
    /// Location of the project config, if one was found
    pub project_config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from parsed arguments and the current directory
    pub fn from_args_and_env(args: &Args) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Self::from_args(args, &cwd)
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: &Args, cwd: &Path) -> Result<Self> {
        let project_config_path = ProjectConfig::discover(cwd);
        let project = match &project_config_path {
            Some(path) => {
                log::debug!("Using project config {}", path.display());
                ProjectConfig::load(path)?
            }
            None => ProjectConfig::default(),
        };
        let project_dir = project_config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        let mut profile_dirs = Vec::new();

        // Default user config directory
        if let Some(config_dir) = dirs::config_dir() {
            profile_dirs.push((
                config_dir.join("docs-ls").join("profiles"),
                ProfilePriority::UserGlobal,
            ));
        }

        // Workspace directory: command line wins over the project file
        let workspace_dir = match &args.profile_dir {
            Some(dir) => Some(cwd.join(dir)),
            None => project.profile_dir.as_ref().map(|dir| project_dir.join(dir)),
        };
        if let Some(dir) = workspace_dir {
            profile_dirs.push((dir, ProfilePriority::Workspace));
        }

        Ok(Config {
            cli_profile: args.profile.clone(),
            project_profile: project.profile,
            profile_dirs,
            docs: project.docs.iter().map(|d| project_dir.join(d)).collect(),
            disabled_rules: project.disabled_rules,
            snippet_timeout: project
                .snippet_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SNIPPET_TIMEOUT),
            log_level: args.log_level.clone(),
            project_config_path,
        })
    }

    pub fn has_project_config(&self) -> bool {
        self.project_config_path.is_some()
    }

    /// Profile name to activate: command line, then project config
    pub fn get_effective_profile(&self) -> Option<String> {
        self.cli_profile
            .clone()
            .or_else(|| self.project_profile.clone())
    }

    /// Paths to check when none are given on the command line
    pub fn doc_paths(&self, cli_paths: &[PathBuf]) -> Vec<PathBuf> {
        if !cli_paths.is_empty() {
            cli_paths.to_vec()
        } else if !self.docs.is_empty() {
            self.docs.clone()
        } else {
            vec![PathBuf::from(".")]
        }
    }

    /// Load every profile source and activate the effective profile
    pub fn build_registry(&self) -> ProfileRegistry {
        let mut registry = ProfileRegistry::with_default_profile();

        for (dir, priority) in &self.profile_dirs {
            if let Err(e) = registry.load_directory(dir, *priority) {
                log::warn!("{}", e);
            }
        }

        if let Some(name) = self.get_effective_profile() {
            if !registry.set_active_profile(&name) {
                log::warn!(
                    "Profile '{}' not found, using '{}' (available: {})",
                    name,
                    DEFAULT_PROFILE,
                    registry.list_profiles().join(", ")
                );
            }
        }

        registry
    }
}
