//! Snippet Profiles
//!
//! Reference toolchain configurations loaded from TOML.

pub mod registry;
pub mod schema;

pub use registry::{ProfileError, ProfilePriority, ProfileRegistry, DEFAULT_PROFILE};
pub use schema::{BuiltinChecker, LanguageDef, Profile, ProfileFile};
