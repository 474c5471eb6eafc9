use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Charter,
    License,
    Accreditation,
    Regulations,
    Reports,
    Collective,
    Prescriptions,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 7] = [
        DocumentCategory::Charter,
        DocumentCategory::License,
        DocumentCategory::Accreditation,
        DocumentCategory::Regulations,
        DocumentCategory::Reports,
        DocumentCategory::Collective,
        DocumentCategory::Prescriptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Charter => "charter",
            DocumentCategory::License => "license",
            DocumentCategory::Accreditation => "accreditation",
            DocumentCategory::Regulations => "regulations",
            DocumentCategory::Reports => "reports",
            DocumentCategory::Collective => "collective",
            DocumentCategory::Prescriptions => "prescriptions",
        }
    }

    pub fn label_ru(&self) -> &'static str {
        match self {
            DocumentCategory::Charter => "Устав",
            DocumentCategory::License => "Лицензия",
            DocumentCategory::Accreditation => "Аккредитация",
            DocumentCategory::Regulations => "Локальные нормативные акты",
            DocumentCategory::Reports => "Отчёты",
            DocumentCategory::Collective => "Коллективный договор",
            DocumentCategory::Prescriptions => "Предписания",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Active,
    Expired,
    NotRequired,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 3] = [
        DocumentStatus::Active,
        DocumentStatus::Expired,
        DocumentStatus::NotRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "active",
            DocumentStatus::Expired => "expired",
            DocumentStatus::NotRequired => "not_required",
        }
    }

    pub fn label_ru(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "Действует",
            DocumentStatus::Expired => "Истёк срок",
            DocumentStatus::NotRequired => "Не требуется",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
    }
}

/// Attachment metadata stored alongside a document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_url: String,
    pub file_name: String,
    pub file_size: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: DocumentCategory,
    pub status: DocumentStatus,
    pub upload_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
}

impl Document {
    pub fn stored_file(&self) -> Option<StoredFile> {
        Some(StoredFile {
            file_url: self.file_url.clone()?,
            file_name: self.file_name.clone()?,
            file_size: self.file_size.clone().unwrap_or_default(),
        })
    }

    pub fn matches_query(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
            || self.category.as_str().contains(needle_lower)
    }
}

/// Fields accepted when creating a document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub category: DocumentCategory,
    pub status: DocumentStatus,
    pub expiry_date: Option<NaiveDate>,
    pub file: Option<StoredFile>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<DocumentCategory>,
    pub status: Option<DocumentStatus>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub file: Option<StoredFile>,
}

impl DocumentChanges {
    pub fn apply(self, document: &mut Document, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            document.title = title;
        }
        if let Some(description) = self.description {
            document.description = description;
        }
        if let Some(category) = self.category {
            document.category = category;
        }
        if let Some(status) = self.status {
            document.status = status;
        }
        if let Some(expiry_date) = self.expiry_date {
            document.expiry_date = expiry_date;
        }
        if let Some(file) = self.file {
            document.file_url = Some(file.file_url);
            document.file_name = Some(file.file_name);
            document.file_size = Some(file.file_size);
        }
        document.last_update = now;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: DocumentCategory,
    pub label: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total: i64,
    pub by_category: Vec<CategoryCount>,
    pub active: i64,
    pub expired: i64,
    pub not_required: i64,
}

impl DocumentStats {
    pub fn from_documents(documents: &[Document]) -> Self {
        let count_status = |status: DocumentStatus| {
            documents.iter().filter(|doc| doc.status == status).count() as i64
        };

        Self {
            total: documents.len() as i64,
            by_category: DocumentCategory::ALL
                .into_iter()
                .map(|category| CategoryCount {
                    category,
                    label: category.label_ru(),
                    count: documents
                        .iter()
                        .filter(|doc| doc.category == category)
                        .count() as i64,
                })
                .collect(),
            active: count_status(DocumentStatus::Active),
            expired: count_status(DocumentStatus::Expired),
            not_required: count_status(DocumentStatus::NotRequired),
        }
    }
}

#[derive(Clone, FromRow)]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub upload_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = String;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let category = DocumentCategory::parse(&row.category)
            .ok_or_else(|| format!("unknown document category `{}`", row.category))?;
        let status = DocumentStatus::parse(&row.status).unwrap_or_default();

        Ok(Document {
            id: row.id,
            title: row.title,
            description: row.description,
            category,
            status,
            upload_date: row.upload_date,
            last_update: row.last_update,
            expiry_date: row.expiry_date,
            file_url: row.file_url,
            file_name: row.file_name,
            file_size: row.file_size,
        })
    }
}
