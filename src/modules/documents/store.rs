use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::model::{
    Document, DocumentCategory, DocumentChanges, DocumentRow, NewDocument, StoredFile,
};

const SELECT_COLUMNS: &str = "SELECT id, title, description, category, status, upload_date, last_update, expiry_date, file_url, file_name, file_size FROM documents";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt document row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an update: the stored document plus the file it displaced, if any.
#[derive(Debug)]
pub struct UpdatedDocument {
    pub document: Document,
    pub replaced_file: Option<StoredFile>,
}

/// Document persistence, backed by Postgres or by a process-local list.
#[derive(Clone)]
pub enum DocumentStore {
    Postgres(PgPool),
    Memory(Arc<RwLock<Vec<Document>>>),
}

impl DocumentStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        info!("document store backed by Postgres");
        Ok(Self::Postgres(pool))
    }

    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(Vec::new())))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            DocumentStore::Postgres(_) => "postgres",
            DocumentStore::Memory(_) => "memory",
        }
    }

    /// All documents, newest upload first.
    pub async fn list(&self) -> StoreResult<Vec<Document>> {
        match self {
            DocumentStore::Postgres(pool) => {
                let rows = sqlx::query_as::<_, DocumentRow>(&format!(
                    "{SELECT_COLUMNS} ORDER BY upload_date DESC"
                ))
                .fetch_all(pool)
                .await?;
                rows_to_documents(rows)
            }
            DocumentStore::Memory(docs) => {
                let guard = docs.read().await;
                let mut list = guard.clone();
                list.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
                Ok(list)
            }
        }
    }

    pub async fn list_by_category(&self, category: DocumentCategory) -> StoreResult<Vec<Document>> {
        match self {
            DocumentStore::Postgres(pool) => {
                let rows = sqlx::query_as::<_, DocumentRow>(&format!(
                    "{SELECT_COLUMNS} WHERE category = $1 ORDER BY upload_date DESC"
                ))
                .bind(category.as_str())
                .fetch_all(pool)
                .await?;
                rows_to_documents(rows)
            }
            DocumentStore::Memory(_) => Ok(self
                .list()
                .await?
                .into_iter()
                .filter(|doc| doc.category == category)
                .collect()),
        }
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<Document>> {
        match self {
            DocumentStore::Postgres(pool) => {
                let row = sqlx::query_as::<_, DocumentRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
                row.map(Document::try_from)
                    .transpose()
                    .map_err(StoreError::Corrupt)
            }
            DocumentStore::Memory(docs) => {
                let guard = docs.read().await;
                Ok(guard.iter().find(|doc| doc.id == id).cloned())
            }
        }
    }

    pub async fn create(&self, new_doc: NewDocument) -> StoreResult<Document> {
        let now = Utc::now();
        let (file_url, file_name, file_size) = match new_doc.file {
            Some(file) => (Some(file.file_url), Some(file.file_name), Some(file.file_size)),
            None => (None, None, None),
        };
        let document = Document {
            id: Uuid::new_v4(),
            title: new_doc.title,
            description: new_doc.description,
            category: new_doc.category,
            status: new_doc.status,
            upload_date: now,
            last_update: now,
            expiry_date: new_doc.expiry_date,
            file_url,
            file_name,
            file_size,
        };

        match self {
            DocumentStore::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO documents (id, title, description, category, status, upload_date, last_update, expiry_date, file_url, file_name, file_size)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                )
                .bind(document.id)
                .bind(&document.title)
                .bind(&document.description)
                .bind(document.category.as_str())
                .bind(document.status.as_str())
                .bind(document.upload_date)
                .bind(document.last_update)
                .bind(document.expiry_date)
                .bind(document.file_url.as_deref())
                .bind(document.file_name.as_deref())
                .bind(document.file_size.as_deref())
                .execute(pool)
                .await?;
            }
            DocumentStore::Memory(docs) => {
                docs.write().await.push(document.clone());
            }
        }

        Ok(document)
    }

    /// Applies `changes`; returns `None` when the id does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        changes: DocumentChanges,
    ) -> StoreResult<Option<UpdatedDocument>> {
        let now = Utc::now();

        match self {
            DocumentStore::Postgres(pool) => {
                let Some(mut document) = self.get(id).await? else {
                    return Ok(None);
                };
                let previous = document.stored_file();
                let replaces_file = changes.file.is_some();
                changes.apply(&mut document, now);

                let result = sqlx::query(
                    "UPDATE documents
                     SET title = $2, description = $3, category = $4, status = $5, last_update = $6,
                         expiry_date = $7, file_url = $8, file_name = $9, file_size = $10
                     WHERE id = $1",
                )
                .bind(document.id)
                .bind(&document.title)
                .bind(&document.description)
                .bind(document.category.as_str())
                .bind(document.status.as_str())
                .bind(document.last_update)
                .bind(document.expiry_date)
                .bind(document.file_url.as_deref())
                .bind(document.file_name.as_deref())
                .bind(document.file_size.as_deref())
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Ok(None);
                }

                Ok(Some(UpdatedDocument {
                    document,
                    replaced_file: previous.filter(|_| replaces_file),
                }))
            }
            DocumentStore::Memory(docs) => {
                let mut guard = docs.write().await;
                let Some(document) = guard.iter_mut().find(|doc| doc.id == id) else {
                    return Ok(None);
                };
                let previous = document.stored_file();
                let replaces_file = changes.file.is_some();
                changes.apply(document, now);

                Ok(Some(UpdatedDocument {
                    document: document.clone(),
                    replaced_file: previous.filter(|_| replaces_file),
                }))
            }
        }
    }

    /// Removes the row and hands back what was stored so the caller can drop the file.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Option<Document>> {
        match self {
            DocumentStore::Postgres(pool) => {
                let row = sqlx::query_as::<_, DocumentRow>(
                    "DELETE FROM documents WHERE id = $1
                     RETURNING id, title, description, category, status, upload_date, last_update, expiry_date, file_url, file_name, file_size",
                )
                .bind(id)
                .fetch_optional(pool)
                .await?;
                row.map(Document::try_from)
                    .transpose()
                    .map_err(StoreError::Corrupt)
            }
            DocumentStore::Memory(docs) => {
                let mut guard = docs.write().await;
                let position = guard.iter().position(|doc| doc.id == id);
                Ok(position.map(|idx| guard.remove(idx)))
            }
        }
    }

    /// Case-insensitive substring match over title, description and category.
    pub async fn search(&self, query: &str) -> StoreResult<Vec<Document>> {
        let needle = query.trim().to_lowercase();

        match self {
            DocumentStore::Postgres(pool) => {
                let pattern = format!("%{}%", escape_like(&needle));
                let rows = sqlx::query_as::<_, DocumentRow>(&format!(
                    "{SELECT_COLUMNS}
                     WHERE title ILIKE $1 OR description ILIKE $1 OR category ILIKE $1
                     ORDER BY upload_date DESC"
                ))
                .bind(pattern)
                .fetch_all(pool)
                .await?;
                rows_to_documents(rows)
            }
            DocumentStore::Memory(_) => Ok(self
                .list()
                .await?
                .into_iter()
                .filter(|doc| doc.matches_query(&needle))
                .collect()),
        }
    }

    pub async fn count(&self) -> StoreResult<i64> {
        match self {
            DocumentStore::Postgres(pool) => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
                    .fetch_one(pool)
                    .await?;
                Ok(total)
            }
            DocumentStore::Memory(docs) => Ok(docs.read().await.len() as i64),
        }
    }
}

fn rows_to_documents(rows: Vec<DocumentRow>) -> StoreResult<Vec<Document>> {
    rows.into_iter()
        .map(|row| Document::try_from(row).map_err(StoreError::Corrupt))
        .collect()
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::documents::model::DocumentStatus;

    fn new_doc(title: &str, category: DocumentCategory) -> NewDocument {
        NewDocument {
            title: title.to_string(),
            description: "test".to_string(),
            category,
            status: DocumentStatus::Active,
            expiry_date: None,
            file: None,
        }
    }

    fn stored(name: &str) -> StoredFile {
        StoredFile {
            file_url: format!("/uploads/documents/{name}"),
            file_name: name.to_string(),
            file_size: "1.0 КБ".to_string(),
        }
    }

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn memory_store_round_trips_created_document() {
        let store = DocumentStore::in_memory();
        let created = store
            .create(new_doc("Устав", DocumentCategory::Charter))
            .await
            .unwrap();

        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Устав");
        assert_eq!(fetched.category, DocumentCategory::Charter);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_reports_replaced_file_only_when_file_changes() {
        let store = DocumentStore::in_memory();
        let mut doc = new_doc("Лицензия", DocumentCategory::License);
        doc.file = Some(stored("old_1.pdf"));
        let created = store.create(doc).await.unwrap();

        let title_only = store
            .update(
                created.id,
                DocumentChanges {
                    title: Some("Лицензия 2024".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(title_only.replaced_file.is_none());
        assert_eq!(title_only.document.file_name.as_deref(), Some("old_1.pdf"));

        let swapped = store
            .update(
                created.id,
                DocumentChanges {
                    file: Some(stored("new_2.pdf")),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            swapped.replaced_file.map(|file| file.file_name),
            Some("old_1.pdf".to_string())
        );
        assert_eq!(swapped.document.file_name.as_deref(), Some("new_2.pdf"));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_return_none() {
        let store = DocumentStore::in_memory();
        let missing = Uuid::new_v4();

        assert!(
            store
                .update(missing, DocumentChanges::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.delete(missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_and_category_filter() {
        let store = DocumentStore::in_memory();
        store
            .create(new_doc("Устав автошколы", DocumentCategory::Charter))
            .await
            .unwrap();
        store
            .create(new_doc("Отчёт о самообследовании", DocumentCategory::Reports))
            .await
            .unwrap();

        let hits = store.search("УСТАВ").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Устав автошколы");

        let reports = store
            .list_by_category(DocumentCategory::Reports)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert!(store.search("лицензия").await.unwrap().is_empty());
    }
}
