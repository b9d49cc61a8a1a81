use std::{
    fs, io,
    path::{Path, PathBuf},
};

use derive_more::{Display, Error};
use nodestrap_diagnostics::{
    miette::{self, Diagnostic},
    tracing,
};
use pipe_trait::Pipe;

/// Manifest shipped inside the template that lists the packages to install.
/// It is consumed and deleted during scaffolding.
pub const DEPS_MANIFEST_FILE: &str = ".config";

/// Packages the template wants installed, split by dependency group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepsManifest {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
}

#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum DepsManifestError {
    #[display("Cannot read dependency manifest {path:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::read_deps_manifest))]
    Read {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

impl DepsManifest {
    /// Parse the manifest text.
    ///
    /// The format is two sections headed by `Deps:` and `DevDeps:` whose
    /// entries are `- <package>` lines. Anything else is ignored.
    pub fn parse(content: &str) -> Self {
        #[derive(Clone, Copy)]
        enum Section {
            None,
            Deps,
            DevDeps,
        }

        let mut manifest = DepsManifest::default();
        let mut section = Section::None;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with("Deps:") {
                section = Section::Deps;
                continue;
            }
            if line.starts_with("DevDeps:") {
                section = Section::DevDeps;
                continue;
            }
            if let Some(package) = line.strip_prefix("- ") {
                match section {
                    Section::Deps => manifest.dependencies.push(package.to_string()),
                    Section::DevDeps => manifest.dev_dependencies.push(package.to_string()),
                    Section::None => {}
                }
            }
        }

        manifest
    }

    /// Read the manifest from the project directory and delete the file.
    /// Its contents only matter once, during scaffolding.
    pub fn load_and_remove(project_dir: &Path) -> Result<Self, DepsManifestError> {
        let path = project_dir.join(DEPS_MANIFEST_FILE);
        let manifest = fs::read_to_string(&path)
            .map_err(|error| DepsManifestError::Read { path: path.clone(), error })?
            .pipe_deref(DepsManifest::parse);
        if let Err(error) = fs::remove_file(&path) {
            tracing::warn!(target: "nodestrap::scaffold", ?path, %error, "Cannot delete dependency manifest");
        }
        Ok(manifest)
    }

    pub fn total(&self) -> usize {
        self.dependencies.len() + self.dev_dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
