use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::lsp::backend::Backend;
use crate::profile::ProfileRegistry;
use crate::Config;

/// Run the language server over stdio until the client disconnects
pub async fn serve(config: Config, profile_registry: ProfileRegistry) -> Result<()> {
    log::info!(
        "Starting language server with profiles: {}",
        profile_registry.list_profiles().join(", ")
    );

    let (service, socket) =
        LspService::build(move |client| Backend::new(client, config, profile_registry)).finish();

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
