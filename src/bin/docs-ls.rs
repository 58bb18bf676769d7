use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use docs_language_server::commands;
use docs_language_server::config::{Args, Command, Config};
use docs_language_server::lsp::serve;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the LSP stream or command output
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    let config = Config::from_args_and_env(&args)?;
    let command = args.command;

    let registry = config.build_registry();

    match command {
        None | Some(Command::Serve) => {
            serve(config, registry).await?;
            Ok(true)
        }
        Some(Command::Check(args)) => commands::check(args, &config, &registry).await,
        Some(Command::Extract(args)) => commands::extract(args),
        Some(Command::Render(args)) => commands::render(args, &config),
        Some(Command::Watch(args)) => commands::watch(args, &config).await,
        Some(Command::Profiles) => Ok(commands::profiles(&registry)),
    }
}
