mod deps_manifest;
mod placeholders;
mod project_config;
mod template;

pub use deps_manifest::{DepsManifest, DepsManifestError, DEPS_MANIFEST_FILE};
pub use placeholders::{
    customize_env_file, customize_package_manifest, customize_readme, merge_app_config,
    PlaceholderError, APP_CONFIG_FILE,
};
pub use project_config::{
    display_project_config, GatherConfigError, GatherProjectConfig, InitOverrides, Language,
    ProjectConfig, DEFAULT_PORT,
};
pub use template::{
    DownloadTemplate, DownloadTemplateError, ExtractTemplate, ExtractTemplateError,
    FetchTemplateError, LOCAL_TEMPLATE_PATH, TEMPLATE_ARCHIVE_NAME, TEMPLATE_BASE_URL,
};
