use std::{
    fs, io,
    io::{Cursor, Read, Write},
    path::{Component, Path, PathBuf},
    time::Duration,
};

use derive_more::{Display, Error};
use indicatif::{ProgressBar, ProgressStyle};
use nodestrap_diagnostics::{
    miette::{self, Diagnostic},
    tracing,
};
use reqwest::Client;
use tar::Archive;
use tempfile::NamedTempFile;
use zune_inflate::{errors::InflateDecodeErrors, DeflateDecoder, DeflateOptions};

use crate::project_config::Language;

/// Host the template archive is fetched from.
pub const TEMPLATE_BASE_URL: &str = "https://nodestrap.github.io/templates/";

/// Name of the template archive, both on the host and on disk.
pub const TEMPLATE_ARCHIVE_NAME: &str = "template.tar.gz";

/// Fallback archive looked up in the working directory when the host cannot
/// be reached.
pub const LOCAL_TEMPLATE_PATH: &str = "template.tar.gz";

/// Directory inside the template subtrees reserved for generator internals.
/// Its contents never end up in a scaffolded project.
const INTERNAL_TEMPLATE_DIR: &str = "_sys";

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to fetch {url}: {error}")]
pub struct FetchTemplateError {
    pub url: String,
    pub error: reqwest::Error,
}

#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum DownloadTemplateError {
    #[diagnostic(code(nodestrap_scaffold::fetch_template))]
    FetchTemplate(FetchTemplateError),

    #[display("Template host answered {status} for {url}")]
    #[diagnostic(code(nodestrap_scaffold::template_status))]
    UnexpectedStatus { url: String, status: reqwest::StatusCode },

    #[display("Cannot read local template {path:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::local_template))]
    LocalTemplate {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to save the template archive: {_0}")]
    #[diagnostic(code(nodestrap_scaffold::save_template))]
    SaveArchive(io::Error),
}

/// This subroutine downloads the template archive to a temporary file.
///
/// A network failure is not fatal when a local copy of the archive exists
/// next to the working directory.
#[must_use]
pub struct DownloadTemplate<'a> {
    /// HTTP client to make HTTP requests.
    pub http_client: &'a Client,
    /// Base URL the archive name is appended to.
    pub base_url: &'a str,
    /// Local archive used when the host is unreachable.
    pub local_fallback: &'a Path,
}

impl<'a> DownloadTemplate<'a> {
    /// Execute the subroutine.
    pub async fn run(self) -> Result<NamedTempFile, DownloadTemplateError> {
        let DownloadTemplate { http_client, base_url, local_fallback } = self;
        let url = format!("{base_url}{TEMPLATE_ARCHIVE_NAME}");

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Downloading template from {url}"));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let bytes = match http_client.get(&url).send().await {
            Ok(response) if !response.status().is_success() => {
                spinner.finish_and_clear();
                return Err(DownloadTemplateError::UnexpectedStatus {
                    url,
                    status: response.status(),
                });
            }
            Ok(response) => {
                let bytes = response.bytes().await.map_err(|error| {
                    spinner.finish_and_clear();
                    DownloadTemplateError::FetchTemplate(FetchTemplateError {
                        url: url.clone(),
                        error,
                    })
                })?;
                tracing::info!(target: "nodestrap::scaffold", ?url, size = bytes.len(), "Template downloaded");
                bytes.to_vec()
            }
            Err(error) => {
                spinner.finish_and_clear();
                tracing::warn!(target: "nodestrap::scaffold", ?url, %error, "Template host unreachable, trying local copy");
                fs::read(local_fallback).map_err(|error| DownloadTemplateError::LocalTemplate {
                    path: local_fallback.to_path_buf(),
                    error,
                })?
            }
        };

        spinner.finish_and_clear();

        let mut archive = NamedTempFile::new().map_err(DownloadTemplateError::SaveArchive)?;
        archive.write_all(&bytes).map_err(DownloadTemplateError::SaveArchive)?;
        Ok(archive)
    }
}

#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ExtractTemplateError {
    #[display("Cannot read template archive {path:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::read_archive))]
    ReadArchive {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to decode gzip: {_0}")]
    #[diagnostic(code(nodestrap_scaffold::decode_gzip))]
    DecodeGzip(InflateDecodeErrors),

    #[display("Failed to read archive entries: {_0}")]
    #[diagnostic(code(nodestrap_scaffold::read_entries))]
    ReadEntries(io::Error),

    #[display("Failed to extract {entry:?}: {error}")]
    #[diagnostic(code(nodestrap_scaffold::write_entry))]
    WriteEntry {
        entry: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

fn decompress_gzip(gz_data: &[u8]) -> Result<Vec<u8>, ExtractTemplateError> {
    let options = DeflateOptions::default().set_confirm_checksum(false);
    DeflateDecoder::new_with_options(gz_data, options)
        .decode_gzip()
        .map_err(ExtractTemplateError::DecodeGzip)
}

/// This subroutine unpacks one language subtree of the template archive into
/// the project directory.
///
/// Entries outside the subtree and entries under `_sys/` are skipped.
#[must_use]
pub struct ExtractTemplate<'a> {
    /// Path to the downloaded archive.
    pub archive_path: &'a Path,
    /// Directory the project files are written into.
    pub project_dir: &'a Path,
    /// Language whose subtree gets extracted.
    pub language: Language,
}

impl<'a> ExtractTemplate<'a> {
    /// Execute the subroutine.
    pub fn run(self) -> Result<(), ExtractTemplateError> {
        let ExtractTemplate { archive_path, project_dir, language } = self;

        let gz_data =
            fs::read(archive_path).map_err(|error| ExtractTemplateError::ReadArchive {
                path: archive_path.to_path_buf(),
                error,
            })?;
        let data = decompress_gzip(&gz_data)?;

        let prefix = Path::new(language.template_prefix());
        let mut extracted = 0usize;

        let mut archive = Archive::new(Cursor::new(data));
        for entry in archive.entries().map_err(ExtractTemplateError::ReadEntries)? {
            let mut entry = entry.map_err(ExtractTemplateError::ReadEntries)?;
            if entry.header().entry_type().is_dir() {
                continue;
            }

            let entry_path =
                entry.path().map_err(ExtractTemplateError::ReadEntries)?.into_owned();
            let Ok(relative) = entry_path.strip_prefix(prefix) else {
                continue;
            };
            if relative.as_os_str().is_empty() || relative.starts_with(INTERNAL_TEMPLATE_DIR) {
                continue;
            }
            // An entry like `ts/../../evil` would land outside the project
            // directory.
            if relative.components().any(|component| component == Component::ParentDir) {
                tracing::warn!(
                    target: "nodestrap::scaffold",
                    entry = ?entry_path,
                    "Skipping entry that escapes the project directory",
                );
                continue;
            }

            let target = project_dir.join(relative);
            let write_error = |error| ExtractTemplateError::WriteEntry {
                entry: entry_path.to_path_buf(),
                error,
            };

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
            let mut buffer = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buffer).map_err(write_error)?;
            fs::write(&target, &buffer).map_err(write_error)?;
            extracted += 1;
        }

        tracing::info!(
            target: "nodestrap::scaffold",
            ?project_dir,
            language = language.display_name(),
            extracted,
            "Template extracted",
        );
        Ok(())
    }
}
