use std::path::PathBuf;

use anyhow::Result;

use crate::config::{CheckArgs, Config, OutputFormat};
use crate::core::{ContentStore, Report};
use crate::profile::ProfileRegistry;
use crate::validation::{lint_document, LintContext, RuleRegistry, SnippetValidator};

/// Lint every document of a store, optionally validating snippets too
pub async fn check_store(
    store: &ContentStore,
    profiles: &ProfileRegistry,
    config: &Config,
    validate_snippets: bool,
) -> Report {
    let rules = RuleRegistry::without(&config.disabled_rules);
    let mut report = Report::new();

    for doc in store.documents() {
        let profile = profiles.profile_for(&doc.text);
        let ctx = LintContext::new(profile).with_resolver(store);
        let mut result = lint_document(&doc.parsed, &ctx, &rules);

        if validate_snippets {
            match profile {
                Some(profile) => {
                    let validator = SnippetValidator::new(profile, config.snippet_timeout);
                    result.extend(validator.validate(doc.document()).await);
                }
                None => log::warn!("No profile for {}; snippets not validated", doc.name),
            }
        }

        let name = if doc.path.as_os_str().is_empty() {
            doc.name.clone()
        } else {
            doc.path.display().to_string()
        };
        report.add(name, result);
    }

    report
}

/// `docs-ls check`
pub async fn check(args: CheckArgs, config: &Config, profiles: &ProfileRegistry) -> Result<bool> {
    let paths: Vec<PathBuf> = config.doc_paths(&args.paths);
    let store = ContentStore::load(&paths)?;
    let report = check_store(&store, profiles, config, args.validate_snippets).await;

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print!("{}", report.render_text(args.verbose)),
    }

    Ok(!report.has_errors())
}
