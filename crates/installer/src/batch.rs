use crate::{InstallPackage, InstallReport, PackageSpec, ResolvedBackend, TaskResult};
use console::style;
use nodestrap_diagnostics::tracing;
use std::{path::Path, sync::Arc};
use tokio::sync::{mpsc, Mutex, Semaphore};

/// Hard cap on simultaneously running install subprocesses within a batch.
pub const MAX_CONCURRENT_INSTALLS: usize = 4;

/// This subroutine fans one install task per package over a permit-bounded
/// pool and aggregates the results into an [`InstallReport`].
///
/// All tasks are spawned immediately; the semaphore is what throttles actual
/// execution. Results are consumed in completion order, which is
/// nondeterministic.
#[must_use]
pub struct InstallBatch<'a> {
    pub backend: &'a ResolvedBackend,
    /// Project directory all install subprocesses run in.
    pub workdir: &'a Path,
    pub packages: Vec<PackageSpec>,
    /// Terminate the process with a non-zero exit on the first failure,
    /// abandoning in-flight tasks.
    pub strict: bool,
}

impl InstallBatch<'_> {
    /// Execute the subroutine.
    pub async fn run(self) -> InstallReport {
        let InstallBatch { backend, workdir, packages, strict } = self;
        let total = packages.len();
        if total == 0 {
            return InstallReport::empty();
        }

        tracing::info!(target: "nodestrap::install", total, strict, "Start batch");

        let backend = Arc::new(backend.clone());
        let workdir: Arc<Path> = Arc::from(workdir);
        // The npm serialization lock lives and dies with this batch.
        let npm_lock = Arc::new(Mutex::new(()));
        let permits = Arc::new(Semaphore::new(total.min(MAX_CONCURRENT_INSTALLS)));
        let (sender, mut receiver) = mpsc::channel::<TaskResult>(total);

        for package in packages {
            let backend = Arc::clone(&backend);
            let workdir = Arc::clone(&workdir);
            let npm_lock = Arc::clone(&npm_lock);
            let permits = Arc::clone(&permits);
            let sender = sender.clone();
            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit =
                    permits.acquire_owned().await.expect("acquire a permit from the install pool");
                let result = InstallPackage {
                    backend: &backend,
                    workdir: &workdir,
                    npm_lock: &npm_lock,
                    package,
                }
                .run()
                .await;
                // A send error means the receiver is gone, which only happens
                // after the batch already concluded.
                sender.send(result).await.ok();
            });
        }
        drop(sender);

        let mut failed = Vec::new();
        let mut completed = 0;
        while completed < total {
            let Some(result) = receiver.recv().await else { break };
            completed += 1;
            print_task_line(&result, completed, total);
            if !result.success {
                if strict {
                    print_strict_abort(&result.package);
                    // In-flight tasks are abandoned, not cancelled. Their
                    // subprocesses are reclaimed by process exit.
                    std::process::exit(1);
                }
                failed.push(result.package);
            }
        }

        tracing::info!(target: "nodestrap::install", total, failed = failed.len(), "Complete batch");

        InstallReport { total, failed }
    }
}

fn print_task_line(result: &TaskResult, completed: usize, total: usize) {
    let progress = format!("[{completed}/{total}]");
    if result.success {
        println!(
            "   {branch} {check} {package}",
            branch = style(format!("├─ {progress}")).dim(),
            check = style("✓").green(),
            package = result.package.label(),
        );
        for line in &result.detail {
            println!("   {bar}  {line}", bar = style("│").dim(), line = style(line).dim());
        }
    } else {
        println!(
            "   {branch} {cross} {package} {tag}",
            branch = style(format!("├─ {progress}")).dim(),
            cross = style("✗").red(),
            package = result.package.label(),
            tag = style("(failed)").red(),
        );
        for line in &result.detail {
            println!(
                "   {bar}  {line}",
                bar = style("│").dim(),
                line = style(format!("→ {line}")).yellow(),
            );
        }
    }
}

fn print_strict_abort(package: &PackageSpec) {
    println!();
    println!("{}", style("✗ Installation failed in strict mode").red());
    println!("{}", style(format!("└─ Failed package: {}", package.label())).dim());
}
