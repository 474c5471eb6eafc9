//! `export-static`: writes the public read-only API as plain JSON files plus an
//! `.htaccess` rewrite map, for hosting the site without the backend.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    modules::{
        documents::{Document, DocumentCategory, DocumentStatus, group_by_category},
        school::SchoolDirectory,
        services::ServicesCatalog,
    },
    web::responses::ApiData,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {name}: {source}")]
    Json {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON files written by the export, relative to the output directory.
pub const EXPORTED_FILES: [&str; 4] = [
    "api/services.json",
    "api/info/basic.json",
    "api/staff.json",
    "api/documents.json",
];

const HTACCESS: &str = r#"Options -MultiViews
RewriteEngine On
RewriteBase /

RewriteRule ^api/services/?$ api/services.json [L]
RewriteRule ^api/info/basic/?$ api/info/basic.json [L]
RewriteRule ^api/staff/?$ api/staff.json [L]
RewriteRule ^api/documents/?$ api/documents.json [L]

<FilesMatch "\.json$">
    Header set Content-Type "application/json; charset=utf-8"
</FilesMatch>

RewriteCond %{REQUEST_FILENAME} !-f
RewriteCond %{REQUEST_FILENAME} !-d
RewriteRule . /index.html [L]
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
}

/// Writes the demo catalog, school info, staff and documents under `out`.
pub async fn export_static(out: &Path) -> Result<ExportSummary, ExportError> {
    let catalog = ServicesCatalog::seed();
    let school = SchoolDirectory::seed();
    let documents = group_by_category(demo_documents());

    let [services_path, basic_path, staff_path, documents_path] = EXPORTED_FILES;
    let mut files = Vec::with_capacity(EXPORTED_FILES.len() + 1);
    files.push(write_json(out, services_path, "services", &catalog).await?);
    files.push(write_json(out, basic_path, "basic info", &school.basic_info).await?);
    files.push(write_json(out, staff_path, "staff", &school.staff).await?);
    files.push(write_json(out, documents_path, "documents", &documents).await?);
    files.push(write_file(out, ".htaccess", HTACCESS.as_bytes()).await?);

    info!(out = %out.display(), files = files.len(), "static export written");
    Ok(ExportSummary { files })
}

async fn write_json<T: Serialize>(
    out: &Path,
    relative: &str,
    name: &'static str,
    data: &T,
) -> Result<PathBuf, ExportError> {
    let body = serde_json::to_vec_pretty(&ApiData::new(data))
        .map_err(|source| ExportError::Json { name, source })?;
    write_file(out, relative, &body).await
}

async fn write_file(out: &Path, relative: &str, body: &[u8]) -> Result<PathBuf, ExportError> {
    let path = out.join(relative);
    let io_error = |source| ExportError::Io {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(&path, body).await.map_err(io_error)?;
    Ok(path)
}

/// Documents published with the static build; files live under `/documents/`.
pub fn demo_documents() -> Vec<Document> {
    let published = demo_timestamp(2024, 9, 2);
    let entry = |seq: u128,
                 title: &str,
                 description: &str,
                 category: DocumentCategory,
                 status: DocumentStatus,
                 file: Option<(&str, &str)>| {
        Document {
            id: Uuid::from_u128(0x7275_6c70_6c75_7300_0000_0000_0000_0000 | seq),
            title: title.to_string(),
            description: description.to_string(),
            category,
            status,
            upload_date: published,
            last_update: published,
            expiry_date: None,
            file_url: file.map(|(name, _)| format!("/documents/{name}")),
            file_name: file.map(|(name, _)| name.to_string()),
            file_size: file.map(|(_, size)| size.to_string()),
        }
    };

    let mut accreditation = entry(
        3,
        "Свидетельство о государственной аккредитации",
        "Аккредитация образовательной программы",
        DocumentCategory::Accreditation,
        DocumentStatus::Active,
        Some(("accreditation.pdf", "845.3 КБ")),
    );
    accreditation.expiry_date = NaiveDate::from_ymd_opt(2030, 6, 30);

    vec![
        entry(
            1,
            "Устав АНО ДПО «Автошкола РУЛЬ+»",
            "Редакция, утверждённая общим собранием учредителей",
            DocumentCategory::Charter,
            DocumentStatus::Active,
            Some(("charter.pdf", "1.2 МБ")),
        ),
        entry(
            2,
            "Лицензия на образовательную деятельность",
            "Бессрочная лицензия Департамента образования",
            DocumentCategory::License,
            DocumentStatus::Active,
            Some(("license.pdf", "512.0 КБ")),
        ),
        accreditation,
        entry(
            4,
            "Правила внутреннего распорядка обучающихся",
            "Локальный нормативный акт",
            DocumentCategory::Regulations,
            DocumentStatus::Active,
            Some(("internal-rules.pdf", "230.4 КБ")),
        ),
        entry(
            5,
            "Отчёт о результатах самообследования за 2023 год",
            "Публикуется ежегодно до 20 апреля",
            DocumentCategory::Reports,
            DocumentStatus::Active,
            Some(("self-assessment-2023.pdf", "2.1 МБ")),
        ),
        entry(
            6,
            "Предписание надзорного органа",
            "Предписаний нет",
            DocumentCategory::Prescriptions,
            DocumentStatus::NotRequired,
            None,
        ),
    ]
}

fn demo_timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}
