mod backend;
mod batch;
mod bootstrap;
mod install_package;
mod output_filter;
mod report;
mod resolve;

pub use backend::{InstallerKind, Invocation, ResolvedBackend, NPM_ONLY_PACKAGES};
pub use batch::{InstallBatch, MAX_CONCURRENT_INSTALLS};
pub use bootstrap::BootstrapInstall;
pub use install_package::{InstallPackage, PackageSpec, TaskResult};
pub use output_filter::{bun_summary_lines, extract_failure_lines};
pub use report::InstallReport;
pub use resolve::{
    lookup_executable, provision_bun_via_npm, InstallMode, ResolveBackend, ResolveBackendError,
};
