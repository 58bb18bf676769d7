//! CLI Commands
//!
//! One module per `docs-ls` subcommand. Each returns whether the run
//! succeeded; the binary turns that into an exit code.

pub mod check;
pub mod extract;
pub mod profiles;
pub mod render;
pub mod watch;

pub use check::{check, check_store};
pub use extract::extract;
pub use profiles::profiles;
pub use render::render;
pub use watch::watch;
