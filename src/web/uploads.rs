use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use axum::{
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};
use chrono::Utc;
use thiserror::Error;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::warn;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

/// Result type used by the shared upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when validating or persisting uploaded files.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Не удалось разобрать форму: {0}")]
    Malformed(String),
    #[error("Поле `{0}` не принимает файлы")]
    UnexpectedFileField(String),
    #[error("В поле `{field}` можно загрузить не более {max} файла(ов)")]
    TooManyFiles { field: String, max: usize },
    #[error("Недопустимый тип файла `{extension}`. Разрешены: PDF, DOC, DOCX, TXT")]
    UnsupportedType { extension: String },
    #[error("Файл превышает допустимый размер {} МБ", .limit / MIB)]
    TooLarge { limit: u64 },
    #[error("Ошибка сохранения файла: {0}")]
    Storage(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn from_multipart(err: MultipartError, limit: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge { limit }
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

/// Configuration describing the expectations for a single multipart file field.
#[derive(Debug, Clone, Copy)]
pub struct FileFieldConfig<'a> {
    pub field_name: &'a str,
    pub allowed_extensions: &'a [&'a str],
    pub max_files: usize,
    pub max_bytes: u64,
}

impl<'a> FileFieldConfig<'a> {
    pub fn new(field_name: &'a str, allowed_extensions: &'a [&'a str], max_bytes: u64) -> Self {
        Self {
            field_name,
            allowed_extensions,
            max_files: 1,
            max_bytes,
        }
    }

    fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

/// Metadata describing a stored upload on disk.
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub field_name: String,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: PathBuf,
    pub file_size: u64,
}

/// Aggregated output of the shared upload processor.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub files: Vec<SavedFile>,
    pub text_fields: HashMap<String, Vec<String>>,
}

impl UploadOutcome {
    pub fn first_file_for(&self, field_name: &str) -> Option<&SavedFile> {
        self.files.iter().find(|file| file.field_name == field_name)
    }

    pub fn first_text(&self, field_name: &str) -> Option<&str> {
        self.text_fields
            .get(field_name)
            .and_then(|values| values.first().map(|s| s.as_str()))
    }

    /// Trimmed, non-empty text value.
    pub fn text(&self, field_name: &str) -> Option<&str> {
        self.first_text(field_name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Deletes every file this outcome wrote, used when a later step fails.
    pub async fn discard(&self) {
        for file in &self.files {
            remove_file_quietly(&file.stored_path).await;
        }
    }
}

/// Ensures the destination directory exists.
pub async fn ensure_directory(path: &Path) -> UploadResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| UploadError::Storage(format!("не удалось создать каталог: {err}")))
}

/// Parses multipart form data, persisting files according to the provided configuration.
///
/// Any file written before an error is removed again, so a rejected request leaves
/// nothing behind in `dest_dir`.
pub async fn process_upload_form(
    multipart: Multipart,
    dest_dir: &Path,
    field_configs: &[FileFieldConfig<'_>],
) -> UploadResult<UploadOutcome> {
    let mut outcome = UploadOutcome::default();
    match read_fields(multipart, dest_dir, field_configs, &mut outcome).await {
        Ok(()) => Ok(outcome),
        Err(err) => {
            outcome.discard().await;
            Err(err)
        }
    }
}

async fn read_fields(
    mut multipart: Multipart,
    dest_dir: &Path,
    field_configs: &[FileFieldConfig<'_>],
    outcome: &mut UploadOutcome,
) -> UploadResult<()> {
    let body_limit = field_configs
        .iter()
        .map(|config| config.max_bytes)
        .max()
        .unwrap_or(MAX_DOCUMENT_BYTES);
    let mut counts: HashMap<&str, usize> = HashMap::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::from_multipart(err, body_limit))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|err| UploadError::from_multipart(err, body_limit))?;
            outcome
                .text_fields
                .entry(field_name)
                .or_default()
                .push(value);
            continue;
        };

        // Browsers send an empty file part when the input was left blank.
        if original_name.is_empty() {
            continue;
        }

        let Some(config) = field_configs
            .iter()
            .find(|config| config.field_name == field_name)
        else {
            return Err(UploadError::UnexpectedFileField(field_name));
        };

        let count = counts.entry(config.field_name).or_default();
        if *count >= config.max_files {
            return Err(UploadError::TooManyFiles {
                field: field_name,
                max: config.max_files,
            });
        }

        let extension = file_extension(&original_name);
        if !config.allows(&extension) {
            return Err(UploadError::UnsupportedType { extension });
        }

        ensure_directory(dest_dir).await?;
        let (stored_name, mut file) = create_unique(
            dest_dir,
            stored_file_name(&original_name, Utc::now().timestamp_millis()),
        )
        .await
        .map_err(|err| UploadError::Storage(err.to_string()))?;
        let stored_path = dest_dir.join(&stored_name);

        // Registered before streaming so a failed write is cleaned up by the caller.
        outcome.files.push(SavedFile {
            field_name: config.field_name.to_string(),
            original_name,
            stored_name,
            stored_path,
            file_size: 0,
        });
        *count += 1;

        let mut total_bytes: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| UploadError::from_multipart(err, config.max_bytes))?
        {
            total_bytes += chunk.len() as u64;
            if total_bytes > config.max_bytes {
                return Err(UploadError::TooLarge {
                    limit: config.max_bytes,
                });
            }
            file.write_all(&chunk)
                .await
                .map_err(|err| UploadError::Storage(err.to_string()))?;
        }
        file.flush()
            .await
            .map_err(|err| UploadError::Storage(err.to_string()))?;

        if let Some(saved) = outcome.files.last_mut() {
            saved.file_size = total_bytes;
        }
    }

    Ok(())
}

/// `license-scan.PDF` stored at `t` becomes `license_scan_<t>.pdf`.
pub fn stored_file_name(original: &str, timestamp_millis: i64) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let sanitized: String = stem
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    let sanitized = if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    };

    let extension = file_extension(original);
    if extension.is_empty() {
        format!("{sanitized}_{timestamp_millis}")
    } else {
        format!("{sanitized}_{timestamp_millis}.{extension}")
    }
}

/// Human readable size in Russian units, e.g. `1.0 МБ`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} Б")
    } else if bytes < MIB {
        format!("{:.1} КБ", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} МБ", bytes as f64 / MIB as f64)
    }
}

/// Removes a stored file, logging anything other than "already gone".
pub async fn remove_file_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!(?err, file = %path.display(), "failed to remove stored file");
        }
    }
}

fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Creates `candidate` in `dir`, or `<stem>_<n>.<ext>` when the name is taken.
/// Never truncates an existing file.
async fn create_unique(dir: &Path, candidate: String) -> std::io::Result<(String, File)> {
    let (stem, extension) = split_name(&candidate);
    let mut attempt = candidate;
    let mut counter = 0usize;
    loop {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&attempt))
            .await
        {
            Ok(file) => return Ok((attempt, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                counter += 1;
                attempt = if extension.is_empty() {
                    format!("{stem}_{counter}")
                } else {
                    format!("{stem}_{counter}.{extension}")
                };
            }
            Err(err) => return Err(err),
        }
    }
}

fn split_name(name: &str) -> (String, String) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();
    (stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_replaces_non_alphanumerics_and_appends_timestamp() {
        assert_eq!(
            stored_file_name("Устав 2024.PDF", 1_700_000_000_000),
            "______2024_1700000000000.pdf"
        );
        assert_eq!(
            stored_file_name("license-scan.docx", 42),
            "license_scan_42.docx"
        );
        assert_eq!(stored_file_name("README", 7), "README_7");
    }

    #[test]
    fn file_sizes_use_russian_units() {
        assert_eq!(format_file_size(512), "512 Б");
        assert_eq!(format_file_size(1536), "1.5 КБ");
        assert_eq!(format_file_size(1024 * 1024), "1.0 МБ");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 МБ");
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let config = FileFieldConfig::new("file", DOCUMENT_EXTENSIONS, MAX_DOCUMENT_BYTES);
        assert!(config.allows("pdf"));
        assert!(config.allows("DOCX"));
        assert!(!config.allows("exe"));
    }

    #[test]
    fn upload_errors_map_to_client_statuses() {
        assert_eq!(
            UploadError::UnsupportedType {
                extension: "exe".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::TooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn existing_file_with_same_name_is_left_intact() {
        let dir = tempfile::tempdir().expect("temp dir");
        tokio::fs::write(dir.path().join("scan_1.pdf"), b"first")
            .await
            .unwrap();

        let (name, mut file) = create_unique(dir.path(), "scan_1.pdf".to_string())
            .await
            .unwrap();
        file.write_all(b"second").await.unwrap();
        file.flush().await.unwrap();

        assert_eq!(name, "scan_1_1.pdf");
        assert_eq!(
            tokio::fs::read(dir.path().join("scan_1.pdf")).await.unwrap(),
            b"first"
        );
        assert_eq!(
            tokio::fs::read(dir.path().join("scan_1_1.pdf")).await.unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_names() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (a, b) = tokio::join!(
            create_unique(dir.path(), "x_1.pdf".to_string()),
            create_unique(dir.path(), "x_1.pdf".to_string()),
        );
        assert_ne!(a.unwrap().0, b.unwrap().0);
    }

    #[test]
    fn split_name_handles_extension() {
        let (stem, ext) = split_name("report.final.docx");
        assert_eq!(stem, "report.final");
        assert_eq!(ext, "docx");
    }
}
