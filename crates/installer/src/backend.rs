use std::{ffi::OsString, path::PathBuf};

/// Packages whose `postinstall` scripts must run for the package to work.
/// Bun skips lifecycle scripts of untrusted packages, so these are always
/// routed through npm even when the bun backend was selected for the batch.
pub const NPM_ONLY_PACKAGES: &[&str] = &["nquickdev"];

/// Which external package manager an invocation goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerKind {
    /// `bun add`. Safe to run concurrently against one project directory.
    Bun,
    /// `npm install`. Concurrent processes race on the same `node_modules`
    /// metadata (observed as ENOTEMPTY/ENOENT), so invocations of this kind
    /// are serialized within a batch.
    Npm,
}

impl InstallerKind {
    pub fn executable_name(self) -> &'static str {
        match self {
            InstallerKind::Bun => "bun",
            InstallerKind::Npm => "npm",
        }
    }

    /// Whether at most one subprocess of this kind may be in flight per batch.
    pub fn requires_serial_execution(self) -> bool {
        matches!(self, InstallerKind::Npm)
    }
}

/// Package manager selected for one installation batch.
///
/// Created once by [`ResolveBackend`](crate::ResolveBackend) and read-only
/// for the rest of the batch.
#[derive(Debug, Clone)]
pub struct ResolvedBackend {
    pub kind: InstallerKind,
    /// Path to the executable as found on the search path.
    pub program: PathBuf,
}

/// A fully determined command line for one package install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kind: InstallerKind,
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ResolvedBackend {
    pub fn from_program(kind: InstallerKind, program: impl Into<PathBuf>) -> Self {
        ResolvedBackend { kind, program: program.into() }
    }

    /// Build the command line that installs `package` through this backend.
    ///
    /// Names listed in [`NPM_ONLY_PACKAGES`] override the bun backend and go
    /// through `npm` (resolved from the search path at spawn time).
    pub fn invocation(&self, package: &str, dev: bool) -> Invocation {
        if self.kind == InstallerKind::Bun && NPM_ONLY_PACKAGES.contains(&package) {
            return Invocation {
                kind: InstallerKind::Npm,
                program: InstallerKind::Npm.executable_name().into(),
                args: npm_install_args(package, dev),
            };
        }

        let args = match self.kind {
            InstallerKind::Bun => bun_add_args(package, dev),
            InstallerKind::Npm => npm_install_args(package, dev),
        };
        Invocation { kind: self.kind, program: self.program.clone().into_os_string(), args }
    }
}

fn npm_install_args(package: &str, dev: bool) -> Vec<OsString> {
    std::iter::once("install")
        .chain(dev.then_some("--save-dev"))
        .chain(std::iter::once(package))
        .map(OsString::from)
        .collect()
}

fn bun_add_args(package: &str, dev: bool) -> Vec<OsString> {
    std::iter::once("add")
        .chain(dev.then_some("-d"))
        .chain(std::iter::once(package))
        .map(OsString::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn bun_backend_builds_bun_add() {
        let backend = ResolvedBackend::from_program(InstallerKind::Bun, "/usr/bin/bun");
        let invocation = backend.invocation("cors", false);
        assert_eq!(invocation.kind, InstallerKind::Bun);
        assert_eq!(invocation.program, OsString::from("/usr/bin/bun"));
        assert_eq!(invocation.args, args(&["add", "cors"]));
    }

    #[test]
    fn bun_backend_builds_bun_add_dev() {
        let backend = ResolvedBackend::from_program(InstallerKind::Bun, "/usr/bin/bun");
        let invocation = backend.invocation("typescript", true);
        assert_eq!(invocation.args, args(&["add", "-d", "typescript"]));
    }

    #[test]
    fn npm_backend_builds_npm_install() {
        let backend = ResolvedBackend::from_program(InstallerKind::Npm, "/usr/bin/npm");
        let invocation = backend.invocation("cors", false);
        assert_eq!(invocation.kind, InstallerKind::Npm);
        assert_eq!(invocation.args, args(&["install", "cors"]));
    }

    #[test]
    fn npm_backend_builds_npm_install_save_dev() {
        let backend = ResolvedBackend::from_program(InstallerKind::Npm, "/usr/bin/npm");
        let invocation = backend.invocation("nodemon", true);
        assert_eq!(invocation.args, args(&["install", "--save-dev", "nodemon"]));
    }

    #[test]
    fn npm_only_package_overrides_bun_backend() {
        let backend = ResolvedBackend::from_program(InstallerKind::Bun, "/usr/bin/bun");
        let invocation = backend.invocation("nquickdev", false);
        assert_eq!(invocation.kind, InstallerKind::Npm);
        assert_eq!(invocation.program, OsString::from("npm"));
        assert_eq!(invocation.args, args(&["install", "nquickdev"]));
    }

    #[test]
    fn npm_only_package_keeps_dev_flag_under_override() {
        let backend = ResolvedBackend::from_program(InstallerKind::Bun, "/usr/bin/bun");
        let invocation = backend.invocation("nquickdev", true);
        assert_eq!(invocation.kind, InstallerKind::Npm);
        assert_eq!(invocation.args, args(&["install", "--save-dev", "nquickdev"]));
    }

    #[test]
    fn npm_only_package_is_unaffected_under_npm_backend() {
        let backend = ResolvedBackend::from_program(InstallerKind::Npm, "/usr/bin/npm");
        let invocation = backend.invocation("nquickdev", false);
        assert_eq!(invocation.program, OsString::from("/usr/bin/npm"));
        assert_eq!(invocation.args, args(&["install", "nquickdev"]));
    }

    #[test]
    fn only_npm_requires_serial_execution() {
        assert!(InstallerKind::Npm.requires_serial_execution());
        assert!(!InstallerKind::Bun.requires_serial_execution());
    }
}
