use console::style;
use miette::{bail, miette, Context};
use nodestrap_installer::{lookup_executable, BootstrapInstall};
use std::path::Path;
use tokio::process::Command;

/// This subroutine boots the project's development server, materializing the
/// dependency tree first when `node_modules` is absent.
#[must_use]
pub struct Start<'a> {
    pub workdir: &'a Path,
}

impl Start<'_> {
    /// Execute the subcommand.
    pub async fn run(self) -> miette::Result<()> {
        let Start { workdir } = self;

        println!("{}", style("🚀 Starting the development server...").green());

        if !workdir.join("package.json").exists() {
            bail!(
                "No package.json found. Are you in a project directory? \
                 Run `nodestrap init` to create a new project.",
            );
        }
        if !workdir.join("src/server.ts").exists() && !workdir.join("src/server.js").exists() {
            bail!(
                "No src/server.ts or src/server.js found. Are you in a project directory? \
                 Run `nodestrap init` to create a new project.",
            );
        }

        if !workdir.join("node_modules").exists() {
            println!("{} Installing dependencies...", style("📦").blue());
            let npm = lookup_executable("npm")
                .ok_or_else(|| miette!("npm could not be found on the search path"))?;
            let succeeded = BootstrapInstall { program: &npm, workdir }
                .run()
                .await
                .wrap_err("install dependencies")?;
            if !succeeded {
                bail!("dependency installation failed");
            }
        }

        println!("{}", style("🔥 Starting development server...").yellow());
        println!("{}", style("Press Ctrl+C to stop the server").dim());
        println!();

        // The server inherits the terminal and runs until interrupted.
        let status = Command::new("npm")
            .args(["run", "dev"])
            .current_dir(workdir)
            .status()
            .await
            .map_err(|error| miette!("failed to run npm: {error}"))?;
        if !status.success() {
            bail!("the development server exited with {status}");
        }
        Ok(())
    }
}
