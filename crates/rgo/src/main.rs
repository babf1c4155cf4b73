mod args;
mod init;
mod log;
mod lsp;

use std::sync::Arc;

use clap::Parser;
use rgo_core::{ConfigStore, Phase, RgoGenerator, WorkspacePaths};
use tracing::error;

use crate::args::{CliArgs, Command, GeneratePhase};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if let Command::Lsp = args.command {
        // stdout carries the LSP protocol; logs go to the cache log dir.
        return lsp::run().await;
    }

    log::init(args.verbosity()?);
    run(args).await.map_err(|e| {
        error!("{:?}", e);
        e
    })?;

    Ok(())
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Generate(cmd_args) => {
            let paths = WorkspacePaths::from_current_dir()?;
            let store = Arc::new(ConfigStore::new(paths.config_file()));
            let phase = match cmd_args.phase {
                GeneratePhase::Edit => Phase::Edit,
                GeneratePhase::Build => Phase::Build,
            };
            let generator = RgoGenerator::new(paths, store).with_phase(phase);
            let summary = generator.run().await?;
            println!(
                "{} repos changed, {} services generated",
                summary.changed_repos.len(),
                summary.generated_services.len()
            );
            if !summary.failed_repos.is_empty() || !summary.failed_services.is_empty() {
                println!(
                    "failures: {} repos, {} services (see logs)",
                    summary.failed_repos.len(),
                    summary.failed_services.len()
                );
            }
        }
        Command::Clean => {
            let paths = WorkspacePaths::from_current_dir()?;
            let store = ConfigStore::new(paths.config_file());
            let config = store.read()?;
            rgo_core::clean(&paths, &config)?;
        }
        Command::Init => init::init()?,
        Command::Lsp => unreachable!("handled in main"),
    }
    Ok(())
}
