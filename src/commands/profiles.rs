use colored::Colorize;

use crate::profile::ProfileRegistry;

/// `docs-ls profiles`
pub fn profiles(registry: &ProfileRegistry) -> bool {
    let active = registry.get_active_profile().map(|p| p.name.as_str());

    for name in registry.list_profiles() {
        let Some(profile) = registry.get_profile(name) else {
            continue;
        };
        let marker = if Some(name) == active { "*".green().bold() } else { " ".normal() };
        let source = match registry.source_of(name) {
            Some(path) => path.display().to_string(),
            None => "built-in".to_string(),
        };
        println!("{} {} {}", marker, name.bold(), format!("({})", source).dimmed());
        if let Some(description) = &profile.description {
            println!("    {}", description);
        }
        println!("    languages: {}", profile.language_names().join(", "));
    }

    true
}
