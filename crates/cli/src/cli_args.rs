pub mod init;
pub mod install;
pub mod start;

use clap::{Parser, Subcommand};
use console::style;
use init::InitArgs;
use install::InstallArgs;
use miette::Context;
use nodestrap_installer::{
    lookup_executable, provision_bun_via_npm, InstallMode, InstallerKind, ResolveBackend,
    ResolvedBackend,
};
use start::Start;
use std::path::PathBuf;

/// Project generator and dependency installer for Nodestrap applications.
#[derive(Debug, Parser)]
#[clap(name = "nodestrap")]
#[clap(bin_name = "nodestrap")]
#[clap(version = "0.0.1")]
#[clap(about = "Project generator and dependency installer for Nodestrap applications")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: CliCommand,

    /// Set working directory.
    #[clap(short = 'C', long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Create a new project from the template
    Init(InitArgs),
    /// Install packages into an existing project
    Install(InstallArgs),
    /// Install dependencies if needed and start the development server
    Start,
}

impl CliArgs {
    /// Execute the command
    pub async fn run(self) -> miette::Result<()> {
        let CliArgs { command, dir } = self;

        match command {
            CliCommand::Init(args) => args.run(&dir).await,
            CliCommand::Install(args) => args.run(&dir).await,
            CliCommand::Start => Start { workdir: &dir }.run().await,
        }
    }
}

/// Map the `--mode` flag to an installation mode. Anything other than the
/// two recognized letters means auto-detection.
fn install_mode(flag: Option<&str>) -> InstallMode {
    match flag {
        Some("b") => InstallMode::ForceBun,
        Some("n") => InstallMode::ForceNpm,
        _ => InstallMode::Auto,
    }
}

/// Select the package manager for a batch and tell the user which one won.
///
/// Provisioning is only allowed during `init`; an ad-hoc `install` never
/// mutates global state behind the user's back.
fn resolve_backend(mode: InstallMode, allow_provision: bool) -> miette::Result<ResolvedBackend> {
    let backend = ResolveBackend {
        mode,
        lookup: lookup_executable,
        provision_bun: allow_provision.then_some(provision_bun_via_npm),
    }
    .run()
    .wrap_err("select a package manager")?;

    match backend.kind {
        InstallerKind::Bun => {
            println!("  {} Using bun for faster installation", style("⚡").cyan());
        }
        InstallerKind::Npm => {
            println!("  {} Using npm", style("→").cyan());
        }
    }
    Ok(backend)
}
