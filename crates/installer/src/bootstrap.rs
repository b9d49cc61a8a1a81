use derive_more::{Display, Error};
use nodestrap_diagnostics::{
    miette::{self, Diagnostic},
    tracing,
};
use std::path::Path;
use tokio::process::Command;

/// Error type of [`BootstrapInstall`].
#[derive(Debug, Display, Error, Diagnostic)]
#[display("failed to run {program}: {error}")]
#[diagnostic(code(nodestrap_installer::bootstrap_io_error))]
pub struct BootstrapInstallError {
    pub program: String,
    #[error(source)]
    pub error: std::io::Error,
}

/// This subroutine runs a whole-project `npm install` with the terminal
/// inherited, streaming output live instead of capturing it.
///
/// Used when a project directory needs its full dependency tree materialized
/// before another command can run (e.g. `nodestrap start` with no
/// `node_modules`). Per-package installs go through
/// [`InstallPackage`](crate::InstallPackage) instead.
#[must_use]
pub struct BootstrapInstall<'a> {
    /// Path to the npm executable.
    pub program: &'a Path,
    pub workdir: &'a Path,
}

impl BootstrapInstall<'_> {
    /// Execute the subroutine. Returns whether the install succeeded.
    pub async fn run(self) -> Result<bool, BootstrapInstallError> {
        let BootstrapInstall { program, workdir } = self;

        tracing::info!(target: "nodestrap::install", ?program, "Bootstrap install");

        Command::new(program)
            .arg("install")
            .current_dir(workdir)
            .status()
            .await
            .map(|status| status.success())
            .map_err(|error| BootstrapInstallError {
                program: program.display().to_string(),
                error,
            })
    }
}
