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
use serde_json::{json, Value};

use crate::project_config::ProjectConfig;

/// Runtime configuration file shipped with the template. The scaffolder
/// merges a `__sys__` section into it.
pub const APP_CONFIG_FILE: &str = "nodestrap.config.json";

#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum PlaceholderError {
    #[display("Cannot read {path:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::read_file))]
    Read {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Cannot parse {path:?} as JSON: {error}")]
    #[diagnostic(code(nodestrap_scaffold::parse_json))]
    Parse {
        path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },

    #[display("{path:?} does not contain a JSON object")]
    #[diagnostic(code(nodestrap_scaffold::not_an_object))]
    NotAnObject { path: PathBuf },

    #[display("Cannot write {path:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::write_file))]
    Write {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

fn read_text(path: &Path) -> Result<String, PlaceholderError> {
    fs::read_to_string(path)
        .map_err(|error| PlaceholderError::Read { path: path.to_path_buf(), error })
}

fn write_text(path: &Path, content: &str) -> Result<(), PlaceholderError> {
    fs::write(path, content)
        .map_err(|error| PlaceholderError::Write { path: path.to_path_buf(), error })
}

fn write_json(path: &Path, value: &Value) -> Result<(), PlaceholderError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| PlaceholderError::Parse { path: path.to_path_buf(), error })?;
    write_text(path, &text)
}

/// Rewrite the template's `package.json` for the new project.
///
/// The dependency groups are emptied on purpose. Packages are installed
/// explicitly afterwards so the lockfile reflects fresh versions.
pub fn customize_package_manifest(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<(), PlaceholderError> {
    let path = project_dir.join("package.json");
    let mut manifest: Value = read_text(&path)?
        .pipe_deref(serde_json::from_str)
        .map_err(|error| PlaceholderError::Parse { path: path.clone(), error })?;
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| PlaceholderError::NotAnObject { path: path.clone() })?;

    object.insert("name".to_string(), json!(package_name(&config.name)));
    object.insert("description".to_string(), json!(config.description));
    object.insert("version".to_string(), json!(config.version));
    object.insert("dependencies".to_string(), json!({}));
    object.insert("devDependencies".to_string(), json!({}));

    write_json(&path, &manifest)
}

/// Substitute the port placeholders in the template's `.env` file.
pub fn customize_env_file(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<(), PlaceholderError> {
    let path = project_dir.join(".env");
    let content = read_text(&path)?
        .replace("{{PORT}}", &config.port.to_string())
        .replace("PORT=8080", &format!("PORT={}", config.port));
    write_text(&path, &content)
}

/// Merge the collected project settings into the app configuration file.
///
/// An unreadable or malformed file is replaced rather than treated as fatal.
pub fn merge_app_config(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<(), PlaceholderError> {
    let path = project_dir.join(APP_CONFIG_FILE);

    let mut app_config = match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
            tracing::warn!(
                target: "nodestrap::scaffold",
                ?path,
                %error,
                "App configuration is not valid JSON, starting over",
            );
            json!({})
        }),
        Err(_) => json!({}),
    };
    let object = app_config
        .as_object_mut()
        .ok_or_else(|| PlaceholderError::NotAnObject { path: path.clone() })?;

    object.insert(
        "__sys__".to_string(),
        json!({
            "__name__": config.name,
            "__description__": config.description,
            "__version__": config.version,
            "__author__": config.author,
            "__alias__": config.alias,
            "__port__": config.port,
        }),
    );

    write_json(&path, &app_config)
}

/// Fill the placeholders in the template's `README.md`.
pub fn customize_readme(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<(), PlaceholderError> {
    let path = project_dir.join("README.md");
    let content = read_text(&path)?
        .replace("{{PROJECT_NAME}}", &config.name)
        .replace("{{PROJECT_DESCRIPTION}}", &config.description)
        .replace("{{PORT}}", &config.port.to_string())
        .replace("{{FEATURES}}", &features_markdown(config));
    write_text(&path, &content)
}

/// Bullet list of the enabled feature toggles. Empty when none are enabled.
fn features_markdown(config: &ProjectConfig) -> String {
    let mut features = String::new();
    if config.with_auth {
        features.push_str("- 🔐 **Authentication** - JWT-based authentication\n");
    }
    if config.with_upload {
        features.push_str("- 📁 **File Upload** - Support for file uploads\n");
    }
    if config.with_multi {
        features.push_str("- 🌐 **Multi-Server** - Multiple server instances\n");
    }
    features
}

/// `package.json` names are lowercase with dashes.
fn package_name(project_name: &str) -> String {
    project_name.to_lowercase().replace(' ', "-")
}
