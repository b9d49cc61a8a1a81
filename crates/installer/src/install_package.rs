use crate::{
    backend::ResolvedBackend,
    output_filter::{bun_summary_lines, extract_failure_lines},
    InstallerKind,
};
use nodestrap_diagnostics::tracing;
use std::{path::Path, process::Stdio};
use tokio::{process::Command, sync::Mutex};

/// One package to install. Duplicate names are each attempted independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    /// Install into the development dependency group.
    pub dev: bool,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        PackageSpec { name: name.into(), dev: false }
    }

    pub fn new_dev(name: impl Into<String>) -> Self {
        PackageSpec { name: name.into(), dev: true }
    }

    /// Package name with its dev tag, as shown in summaries.
    pub fn label(&self) -> String {
        if self.dev {
            format!("{} (dev)", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Outcome of one install attempt. Subprocess failures never escape the task
/// as errors; they always arrive here as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub package: PackageSpec,
    pub success: bool,
    /// On failure: up to 5 stderr lines explaining the cause.
    /// On success: bun's cosmetic install summary, empty for npm.
    pub detail: Vec<String>,
}

/// This subroutine installs a single package through the selected backend,
/// capturing output for post-hoc filtering.
#[must_use]
pub struct InstallPackage<'a> {
    pub backend: &'a ResolvedBackend,
    /// Project directory the subprocess runs in.
    pub workdir: &'a Path,
    /// Batch-wide lock serializing npm invocations (see
    /// [`InstallerKind::requires_serial_execution`]).
    pub npm_lock: &'a Mutex<()>,
    pub package: PackageSpec,
}

impl<'a> InstallPackage<'a> {
    /// Execute the subroutine.
    pub async fn run(self) -> TaskResult {
        let InstallPackage { backend, workdir, npm_lock, package } = self;
        let invocation = backend.invocation(&package.name, package.dev);

        tracing::info!(
            target: "nodestrap::install",
            package = package.name.as_str(),
            program = ?invocation.program,
            "Start package",
        );

        // Held across the subprocess await, released on every exit path.
        let _serial_guard = if invocation.kind.requires_serial_execution() {
            Some(npm_lock.lock().await)
        } else {
            None
        };

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let result = match output {
            Err(error) => TaskResult {
                detail: vec![format!(
                    "failed to spawn {program}: {error}",
                    program = invocation.program.to_string_lossy(),
                )],
                success: false,
                package,
            },
            Ok(output) if output.status.success() => {
                let detail = if invocation.kind == InstallerKind::Bun {
                    bun_summary_lines(
                        &String::from_utf8_lossy(&output.stdout),
                        &String::from_utf8_lossy(&output.stderr),
                    )
                } else {
                    Vec::new()
                };
                TaskResult { package, success: true, detail }
            }
            Ok(output) => TaskResult {
                detail: extract_failure_lines(&String::from_utf8_lossy(&output.stderr)),
                success: false,
                package,
            },
        };

        tracing::info!(
            target: "nodestrap::install",
            package = result.package.name.as_str(),
            success = result.success,
            "Complete package",
        );

        result
    }
}
