//! Tests for project configuration discovery and profile selection
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use docs_language_server::config::{Args, Config};
use docs_language_server::profile::ProfilePriority;

const WORKSPACE_PROFILE: &str = r#"
[profile]
name = "backend"
description = "Rust services"

[[languages]]
name = "rust"
aliases = ["rs"]
extension = "rs"
command = ["rustc", "--edition", "2021", "--crate-type", "lib", "{file}"]
"#;

#[test]
fn test_project_config_profile_selection() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(".docs-ls.toml"),
        "profile = \"backend\"\nprofile_dir = \"profiles\"\ndocs = [\"guides\"]\ndisabled_rules = [\"unpaired-snippet\"]\nsnippet_timeout_secs = 5\n",
    )
    .expect("write project config");
    fs::create_dir(dir.path().join("profiles")).expect("create profile dir");
    fs::write(dir.path().join("profiles/backend.toml"), WORKSPACE_PROFILE).expect("write profile");

    // Discovery walks up from a nested directory
    let nested = dir.path().join("guides/deep");
    fs::create_dir_all(&nested).expect("create nested dir");

    let args = Args::try_parse_from(["docs-ls", "check"]).expect("parse args");
    let config = Config::from_args(&args, &nested).expect("create config");

    assert!(config.has_project_config());
    assert_eq!(config.get_effective_profile().as_deref(), Some("backend"));
    assert_eq!(config.docs, vec![dir.path().join("guides")]);
    assert_eq!(config.disabled_rules, vec!["unpaired-snippet".to_string()]);
    assert_eq!(config.snippet_timeout, Duration::from_secs(5));
    assert!(config
        .profile_dirs
        .contains(&(dir.path().join("profiles"), ProfilePriority::Workspace)));

    let registry = config.build_registry();
    let active = registry.get_active_profile().expect("active profile");
    assert_eq!(active.name, "backend");
    assert!(active.language("rs").is_some());
    assert_eq!(registry.priority_of("backend"), Some(ProfilePriority::Workspace));
}

#[test]
fn test_cli_profile_overrides_project_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(".docs-ls.toml"), "profile = \"backend\"\n").expect("write config");

    let args = Args::try_parse_from(["docs-ls", "--profile", "default"]).expect("parse args");
    let config = Config::from_args(&args, dir.path()).expect("create config");

    assert_eq!(config.project_profile.as_deref(), Some("backend"));
    assert_eq!(config.get_effective_profile().as_deref(), Some("default"));
}

#[test]
fn test_unknown_profile_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = Args::try_parse_from(["docs-ls", "--profile", "missing"]).expect("parse args");
    let config = Config::from_args(&args, dir.path()).expect("create config");

    let registry = config.build_registry();
    assert_eq!(
        registry.get_active_profile().map(|p| p.name.as_str()),
        Some("default")
    );
}

#[test]
fn test_doc_paths_precedence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = Args::try_parse_from(["docs-ls"]).expect("parse args");
    let config = Config::from_args(&args, dir.path()).expect("create config");

    assert!(!config.has_project_config());
    assert_eq!(config.doc_paths(&[]), vec![PathBuf::from(".")]);
    assert_eq!(
        config.doc_paths(&[PathBuf::from("README.md")]),
        vec![PathBuf::from("README.md")]
    );
}

#[test]
fn test_invalid_project_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(".docs-ls.toml"), "profle = \"typo\"\n").expect("write config");

    let args = Args::try_parse_from(["docs-ls"]).expect("parse args");
    assert!(Config::from_args(&args, dir.path()).is_err());
}

#[test]
fn test_project_config_discovery_is_logged() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(".docs-ls.toml"), "disabled_rules = []\n").expect("write project config");

    let bin_path = std::env::var("CARGO_BIN_EXE_docs-ls")
        .map(PathBuf::from)
        .expect("CARGO_BIN_EXE_docs-ls is set for integration tests");
    let output = std::process::Command::new(bin_path)
        .args(["--log-level", "debug", "profiles"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("run docs-ls");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Using project config"), "stderr: {}", stderr);
}
