use super::{install_mode, resolve_backend};
use clap::Args;
use console::style;
use miette::bail;
use nodestrap_installer::{InstallBatch, PackageSpec};
use std::path::Path;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Names of the packages to install.
    #[clap(required = true)]
    pub packages: Vec<String>,

    /// Package manager preference: `b` forces bun, `n` forces npm.
    #[clap(short, long)]
    pub mode: Option<String>,

    /// Install the packages as devDependencies.
    #[clap(short = 'D', long)]
    pub save_dev: bool,

    /// Exit with a non-zero status as soon as one package fails.
    #[clap(long)]
    pub strict: bool,
}

impl InstallArgs {
    /// Execute the subcommand.
    pub async fn run(self, workdir: &Path) -> miette::Result<()> {
        let InstallArgs { packages, mode, save_dev, strict } = self;

        if !workdir.join("package.json").exists() {
            bail!(
                "No package.json found in {workdir:?}. Run this command inside a project directory.",
            );
        }

        println!(
            "{} Installing {count} package(s)...",
            style("📦").magenta(),
            count = packages.len(),
        );

        let backend = resolve_backend(install_mode(mode.as_deref()), false)?;

        let packages: Vec<PackageSpec> = packages
            .into_iter()
            .map(|name| if save_dev { PackageSpec::new_dev(name) } else { PackageSpec::new(name) })
            .collect();

        let report = InstallBatch { backend: &backend, workdir, packages, strict }.run().await;
        report.print_summary();
        Ok(())
    }
}
