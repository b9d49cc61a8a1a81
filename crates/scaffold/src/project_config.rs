use std::{
    fs, io,
    path::{Path, PathBuf},
};

use console::style;
use derive_more::{Display, Error};
use inquire::{InquireError, Select, Text};
use nodestrap_diagnostics::miette::{self, Diagnostic};
use pipe_trait::Pipe;

/// Port written into the generated project when the user does not pick one.
pub const DEFAULT_PORT: u16 = 3000;

const DEFAULT_NAME: &str = "my-nodestrap-app";
const DEFAULT_DESCRIPTION: &str = "A Nodestrap application";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_ALIAS: &str = "NsApp";
const DEFAULT_AUTHOR: &str = "Nodestrap-Team";

/// Source language of the generated project. Selects which subtree of the
/// template archive gets extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    TypeScript,
    JavaScript,
}

impl Language {
    pub fn display_name(self) -> &'static str {
        match self {
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
        }
    }

    /// Directory inside the template archive that holds this language's files.
    pub fn template_prefix(self) -> &'static str {
        match self {
            Language::TypeScript => "ts",
            Language::JavaScript => "js",
        }
    }

    /// Entry point the dev server is expected to boot from.
    pub fn server_entry(self) -> &'static str {
        match self {
            Language::TypeScript => "src/server.ts",
            Language::JavaScript => "src/server.js",
        }
    }

    /// Anything that is not recognizably JavaScript means TypeScript.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "js" | "javascript" => Language::JavaScript,
            _ => Language::TypeScript,
        }
    }
}

/// Everything the scaffolding steps need to know about the project being
/// created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    pub port: u16,
    pub language: Language,
    pub alias: String,
    pub author: String,
    /// JWT authentication scaffolding, on by default.
    pub with_auth: bool,
    /// File upload scaffolding, on by default.
    pub with_upload: bool,
    /// Multi-server setup, off by default.
    pub with_multi: bool,
}

impl ProjectConfig {
    /// Directory the project will be created in, relative to the working
    /// directory.
    pub fn project_dir(&self, parent: &Path) -> PathBuf {
        parent.join(&self.name)
    }

    /// Names of the enabled feature toggles.
    pub fn feature_names(&self) -> Vec<&'static str> {
        std::iter::empty()
            .chain(self.with_auth.then_some("Authentication"))
            .chain(self.with_upload.then_some("File Upload"))
            .chain(self.with_multi.then_some("Multi-Server"))
            .collect()
    }
}

/// Values provided via command-line flags. A `None` field is asked for
/// interactively instead.
#[derive(Debug, Clone, Default)]
pub struct InitOverrides {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub port: Option<u16>,
    pub version: Option<String>,
    pub alias: Option<String>,
    pub author: Option<String>,
}

/// Error when collecting the project configuration.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum GatherConfigError {
    #[display("failed to read user input: {_0}")]
    #[diagnostic(code(nodestrap_scaffold::prompt_input))]
    Prompt(InquireError),

    #[display("failed to clear existing directory {dir:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::clear_dir))]
    ClearDirectory {
        dir: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// This subroutine collects the project configuration, preferring flag values
/// and prompting for the rest. When the target directory already holds files
/// the user chooses between wiping it and picking another name.
#[must_use]
pub struct GatherProjectConfig<'a> {
    pub workdir: &'a Path,
    pub overrides: InitOverrides,
}

impl<'a> GatherProjectConfig<'a> {
    pub fn run(self) -> Result<ProjectConfig, GatherConfigError> {
        let GatherProjectConfig { workdir, overrides } = self;

        let mut name_override = overrides.name;
        let name = loop {
            let candidate = match name_override.take() {
                Some(name) => name,
                None => Text::new("Project name:")
                    .with_default(DEFAULT_NAME)
                    .prompt()
                    .map_err(GatherConfigError::Prompt)?,
            };

            let target = workdir.join(&candidate);
            if !directory_is_occupied(&target) {
                break candidate;
            }

            eprintln!(
                "{} Directory {} already exists and is not empty.",
                style("⚠").yellow(),
                style(&candidate).cyan(),
            );
            let choice = Select::new(
                "How do you want to proceed?",
                vec!["Delete the directory and start fresh", "Choose a different name"],
            )
            .prompt()
            .map_err(GatherConfigError::Prompt)?;

            if choice == "Delete the directory and start fresh" {
                fs::remove_dir_all(&target)
                    .map_err(|error| GatherConfigError::ClearDirectory { dir: target, error })?;
                break candidate;
            }
        };

        let description = match overrides.description {
            Some(description) => description,
            None => Text::new("Description:")
                .with_default(DEFAULT_DESCRIPTION)
                .prompt()
                .map_err(GatherConfigError::Prompt)?,
        };

        let language = match overrides.language {
            Some(language) => Language::parse_lenient(&language),
            None => Select::new("Language:", vec!["TypeScript", "JavaScript"])
                .prompt()
                .map_err(GatherConfigError::Prompt)?
                .pipe(Language::parse_lenient),
        };

        let port = match overrides.port {
            Some(port) => port,
            None => {
                let answer = Text::new("Server port:")
                    .with_default(&DEFAULT_PORT.to_string())
                    .prompt()
                    .map_err(GatherConfigError::Prompt)?;
                parse_port(&answer).unwrap_or_else(|| {
                    eprintln!(
                        "{} Invalid port {answer:?}, falling back to {DEFAULT_PORT}.",
                        style("⚠").yellow(),
                    );
                    DEFAULT_PORT
                })
            }
        };

        let version = match overrides.version {
            Some(version) => version,
            None => Text::new("Version:")
                .with_default(DEFAULT_VERSION)
                .prompt()
                .map_err(GatherConfigError::Prompt)?,
        };

        let alias = match overrides.alias {
            Some(alias) => alias,
            None => Text::new("App alias:")
                .with_default(DEFAULT_ALIAS)
                .prompt()
                .map_err(GatherConfigError::Prompt)?,
        };

        let author = match overrides.author {
            Some(author) => author,
            None => Text::new("Author:")
                .with_default(DEFAULT_AUTHOR)
                .prompt()
                .map_err(GatherConfigError::Prompt)?,
        };

        Ok(ProjectConfig {
            name,
            description,
            version,
            port,
            language,
            alias,
            author,
            with_auth: true,
            with_upload: true,
            with_multi: false,
        })
    }
}

/// Print the collected configuration as a small tree before scaffolding
/// starts.
pub fn display_project_config(config: &ProjectConfig) {
    eprintln!();
    eprintln!("{}", style("Project configuration").bold());
    eprintln!("├─ name: {}", style(&config.name).cyan());
    eprintln!("├─ description: {}", &config.description);
    eprintln!("├─ language: {}", config.language.display_name());
    eprintln!("├─ port: {}", config.port);
    eprintln!("├─ version: {}", &config.version);
    eprintln!("├─ alias: {}", &config.alias);
    eprintln!("├─ author: {}", &config.author);
    let features = config.feature_names();
    eprintln!("└─ features: {}", if features.is_empty() { "none".to_string() } else { features.join(", ") });
    eprintln!();
}

fn directory_is_occupied(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

fn parse_port(value: &str) -> Option<u16> {
    let port = value.trim().parse::<u16>().ok()?;
    (port != 0).then_some(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lenient_language_parsing_defaults_to_typescript() {
        assert_eq!(Language::parse_lenient("js"), Language::JavaScript);
        assert_eq!(Language::parse_lenient("JavaScript"), Language::JavaScript);
        assert_eq!(Language::parse_lenient("ts"), Language::TypeScript);
        assert_eq!(Language::parse_lenient("typescript"), Language::TypeScript);
        assert_eq!(Language::parse_lenient("python"), Language::TypeScript);
        assert_eq!(Language::parse_lenient(""), Language::TypeScript);
    }

    #[test]
    fn template_prefix_matches_language() {
        assert_eq!(Language::TypeScript.template_prefix(), "ts");
        assert_eq!(Language::JavaScript.template_prefix(), "js");
    }

    #[test]
    fn port_parsing_rejects_junk_and_zero() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port(" 8080 "), Some(8080));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("eighty"), None);
    }

    #[test]
    fn occupied_check_ignores_missing_and_empty_directories() {
        let workdir = tempfile::tempdir().expect("create temporary directory");
        assert!(!directory_is_occupied(&workdir.path().join("missing")));

        let empty = workdir.path().join("empty");
        fs::create_dir(&empty).expect("create empty directory");
        assert!(!directory_is_occupied(&empty));

        let occupied = workdir.path().join("occupied");
        fs::create_dir(&occupied).expect("create occupied directory");
        fs::write(occupied.join("file.txt"), "content").expect("write file");
        assert!(directory_is_occupied(&occupied));
    }
}
