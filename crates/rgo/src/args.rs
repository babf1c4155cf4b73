use anyhow::bail;
use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// RGO lets you edit Go code that calls RPC services whose Thrift IDLs live
/// in remote repositories, without vendoring generated stubs.
#[derive(clap::Parser, Debug)]
#[command(version, author)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
    /// Print additional information in logs.
    ///
    /// `-v` sets the log level to DEBUG, `-vv` to TRACE.
    /// To change the log level without a flag, use the `RGO_LOG`
    /// environment variable, e.g. `RGO_LOG=DEBUG`.
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
    )]
    verbose: u8,
}

impl CliArgs {
    pub fn verbosity(&self) -> anyhow::Result<Option<LevelFilter>> {
        let level = match self.verbose {
            0 => None,
            1 => Some(LevelFilter::DEBUG),
            2 => Some(LevelFilter::TRACE),
            _ => bail!("invalid verbosity level. Use -v or -vv."),
        };
        Ok(level)
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Fetch the configured IDL repositories and regenerate every service
    /// whose pinned revision changed.
    Generate(Generate),
    /// Remove the generated service trees, their package metadata, and
    /// their `go.work` entries.
    Clean,
    /// Write a starter `rgo_config.yaml` in the current directory.
    Init,
    /// Run the language-server shell: watch the config file, regenerate on
    /// change, and tell the editor to restart its language services.
    Lsp,
}

#[derive(clap::Args, Debug)]
pub struct Generate {
    /// Which client rendering to produce.
    ///
    /// `edit` is the IDE-facing stub with empty bodies; `build` delegates to
    /// the real Kitex client and is what compilation should see.
    #[arg(long, value_enum, default_value = "edit")]
    pub phase: GeneratePhase,
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum GeneratePhase {
    Edit,
    Build,
}
