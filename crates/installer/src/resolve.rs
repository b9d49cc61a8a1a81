use crate::backend::{InstallerKind, ResolvedBackend};
use derive_more::{Display, Error};
use nodestrap_diagnostics::{
    miette::{self, Diagnostic},
    tracing,
};
use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

/// Caller preference for which package manager a batch should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    /// Prefer bun, auto-provisioning it when permitted, fall back to npm.
    #[default]
    Auto,
    /// Require bun, fall back to npm when bun is missing.
    ForceBun,
    /// Require npm.
    ForceNpm,
}

/// Error type of [`ResolveBackend`]. No package task runs when this occurs.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ResolveBackendError {
    #[display("npm was requested but could not be found on the search path")]
    #[diagnostic(code(nodestrap_installer::npm_not_found))]
    NpmNotFound,

    #[display("neither bun nor npm could be found on the search path")]
    #[diagnostic(code(nodestrap_installer::no_backend_found))]
    NoBackendFound,
}

/// This subroutine decides which package manager executable one batch uses.
///
/// Executable lookup and bun provisioning are injected so the fallback chain
/// can be exercised without touching the real search path or the network.
#[must_use]
pub struct ResolveBackend<Lookup, Provision>
where
    Lookup: Fn(&str) -> Option<PathBuf>,
    Provision: FnOnce() -> bool,
{
    pub mode: InstallMode,
    /// Find an executable on the search path, [`which::which`] in production.
    pub lookup: Lookup,
    /// One-time, best-effort attempt to install bun. Its failure is swallowed
    /// and merely causes the fallback to npm. `None` disables provisioning
    /// (the ad-hoc install path never provisions).
    pub provision_bun: Option<Provision>,
}

impl<Lookup, Provision> ResolveBackend<Lookup, Provision>
where
    Lookup: Fn(&str) -> Option<PathBuf>,
    Provision: FnOnce() -> bool,
{
    /// Execute the subroutine.
    pub fn run(self) -> Result<ResolvedBackend, ResolveBackendError> {
        let ResolveBackend { mode, lookup, provision_bun } = self;
        let find = |kind: InstallerKind| {
            lookup(kind.executable_name())
                .map(|program| ResolvedBackend { kind, program })
        };

        match mode {
            InstallMode::ForceNpm => {
                find(InstallerKind::Npm).ok_or(ResolveBackendError::NpmNotFound)
            }
            InstallMode::ForceBun => find(InstallerKind::Bun)
                .or_else(|| find(InstallerKind::Npm))
                .ok_or(ResolveBackendError::NoBackendFound),
            InstallMode::Auto => {
                if let Some(backend) = find(InstallerKind::Bun) {
                    return Ok(backend);
                }
                if let Some(provision) = provision_bun {
                    tracing::info!(target: "nodestrap::resolve", "bun not found, attempting to provision it");
                    if provision() {
                        if let Some(backend) = find(InstallerKind::Bun) {
                            return Ok(backend);
                        }
                    }
                }
                find(InstallerKind::Npm).ok_or(ResolveBackendError::NoBackendFound)
            }
        }
    }
}

/// Production lookup function: resolve `name` against the search path.
pub fn lookup_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Production provisioner: `npm install -g bun` with all output discarded.
pub fn provision_bun_via_npm() -> bool {
    Command::new("npm")
        .args(["install", "-g", "bun"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn only(available: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |name| {
            available.contains(&name).then(|| PathBuf::from(format!("/fake/bin/{name}")))
        }
    }

    const NO_PROVISION: Option<fn() -> bool> = None;

    #[test]
    fn auto_prefers_bun_when_present() {
        let backend = ResolveBackend {
            mode: InstallMode::Auto,
            lookup: only(&["bun", "npm"]),
            provision_bun: NO_PROVISION,
        }
        .run()
        .unwrap();
        assert_eq!(backend.kind, InstallerKind::Bun);
        assert_eq!(backend.program, PathBuf::from("/fake/bin/bun"));
    }

    #[test]
    fn auto_falls_back_to_npm_when_provision_fails() {
        let attempted = Cell::new(false);
        let backend = ResolveBackend {
            mode: InstallMode::Auto,
            lookup: only(&["npm"]),
            provision_bun: Some(|| {
                attempted.set(true);
                false
            }),
        }
        .run()
        .unwrap();
        assert!(attempted.get());
        assert_eq!(backend.kind, InstallerKind::Npm);
    }

    #[test]
    fn auto_uses_bun_after_successful_provision() {
        // the lookup starts returning bun once provisioning "installed" it
        let provisioned = Cell::new(false);
        let lookup = |name: &str| match name {
            "npm" => Some(PathBuf::from("/fake/bin/npm")),
            "bun" if provisioned.get() => Some(PathBuf::from("/fake/bin/bun")),
            _ => None,
        };
        let backend = ResolveBackend {
            mode: InstallMode::Auto,
            lookup,
            provision_bun: Some(|| {
                provisioned.set(true);
                true
            }),
        }
        .run()
        .unwrap();
        assert_eq!(backend.kind, InstallerKind::Bun);
    }

    #[test]
    fn auto_without_provision_skips_straight_to_npm() {
        let backend = ResolveBackend {
            mode: InstallMode::Auto,
            lookup: only(&["npm"]),
            provision_bun: NO_PROVISION,
        }
        .run()
        .unwrap();
        assert_eq!(backend.kind, InstallerKind::Npm);
    }

    #[test]
    fn auto_with_nothing_available_is_fatal() {
        let error = ResolveBackend {
            mode: InstallMode::Auto,
            lookup: only(&[]),
            provision_bun: Some(|| false),
        }
        .run()
        .unwrap_err();
        assert!(matches!(error, ResolveBackendError::NoBackendFound));
    }

    #[test]
    fn force_npm_requires_npm() {
        let error = ResolveBackend {
            mode: InstallMode::ForceNpm,
            lookup: only(&["bun"]),
            provision_bun: NO_PROVISION,
        }
        .run()
        .unwrap_err();
        assert!(matches!(error, ResolveBackendError::NpmNotFound));
    }

    #[test]
    fn force_bun_falls_back_to_npm() {
        let backend = ResolveBackend {
            mode: InstallMode::ForceBun,
            lookup: only(&["npm"]),
            provision_bun: NO_PROVISION,
        }
        .run()
        .unwrap();
        assert_eq!(backend.kind, InstallerKind::Npm);
    }

    #[test]
    fn force_bun_with_nothing_available_is_fatal() {
        let error = ResolveBackend {
            mode: InstallMode::ForceBun,
            lookup: only(&[]),
            provision_bun: NO_PROVISION,
        }
        .run()
        .unwrap_err();
        assert!(matches!(error, ResolveBackendError::NoBackendFound));
    }
}
