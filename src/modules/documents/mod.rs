mod model;
mod store;

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path as AxumPath, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::{DateTime, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

pub use model::{
    Document, DocumentCategory, DocumentChanges, DocumentStats, DocumentStatus, NewDocument,
    StoredFile,
};
pub use store::DocumentStore;

use crate::web::{
    AppState,
    responses::{
        ApiData, ApiError, ApiResult, bad_request, internal_error, json_error, not_found, ok,
    },
    storage::{content_type_for, resolve_within, stream_file},
    uploads::{
        DOCUMENT_EXTENSIONS, FileFieldConfig, MAX_DOCUMENT_BYTES, UploadOutcome,
        format_file_size, process_upload_form, remove_file_quietly,
    },
};

const FILE_FIELD: &str = "file";
pub const DOCUMENT_URL_PREFIX: &str = "/uploads/documents/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/documents",
            get(list_grouped).post(create_document),
        )
        .route(
            "/api/documents/category/:category",
            get(list_by_category),
        )
        .route("/api/documents/search/:query", get(search_documents))
        .route("/api/documents/stats/overview", get(document_stats))
        .route(
            "/api/documents/:id",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route("/api/documents/:id/download", get(download_document))
}

pub type GroupedDocuments = BTreeMap<&'static str, Vec<Document>>;

/// Buckets documents by category slug; every category is present even when empty.
pub fn group_by_category(documents: Vec<Document>) -> GroupedDocuments {
    let mut grouped: GroupedDocuments = DocumentCategory::ALL
        .into_iter()
        .map(|category| (category.as_str(), Vec::new()))
        .collect();
    for document in documents {
        grouped
            .entry(document.category.as_str())
            .or_default()
            .push(document);
    }
    grouped
}

async fn list_grouped(State(state): State<AppState>) -> ApiResult<GroupedDocuments> {
    let documents = state.documents().list().await.map_err(internal_error)?;
    ok(group_by_category(documents))
}

async fn list_by_category(
    State(state): State<AppState>,
    AxumPath(category): AxumPath<String>,
) -> ApiResult<Vec<Document>> {
    let category = parse_category(&category)?;
    let documents = state
        .documents()
        .list_by_category(category)
        .await
        .map_err(internal_error)?;
    ok(documents)
}

async fn get_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> ApiResult<Document> {
    let document = state
        .documents()
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(document_not_found)?;
    ok(document)
}

async fn search_documents(
    State(state): State<AppState>,
    AxumPath(query): AxumPath<String>,
) -> ApiResult<Vec<Document>> {
    let documents = state
        .documents()
        .search(&query)
        .await
        .map_err(internal_error)?;
    ok(documents)
}

async fn document_stats(State(state): State<AppState>) -> ApiResult<DocumentStats> {
    let documents = state.documents().list().await.map_err(internal_error)?;
    ok(DocumentStats::from_documents(&documents))
}

async fn create_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiData<Document>>), ApiError> {
    let upload = receive_form(&state, multipart).await?;

    let new_doc = match new_document_from_form(&upload) {
        Ok(new_doc) => new_doc,
        Err(err) => {
            upload.discard().await;
            return Err(err);
        }
    };

    let document = match state.documents().create(new_doc).await {
        Ok(document) => document,
        Err(err) => {
            upload.discard().await;
            return Err(internal_error(err));
        }
    };

    let original = upload
        .first_file_for(FILE_FIELD)
        .map(|saved| saved.original_name.as_str());
    info!(id = %document.id, category = %document.category, ?original, "document created");
    Ok((
        StatusCode::CREATED,
        Json(ApiData::with_message(document, "Документ успешно создан")),
    ))
}

async fn update_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
    multipart: Multipart,
) -> ApiResult<Document> {
    let upload = receive_form(&state, multipart).await?;

    let changes = match changes_from_form(&upload) {
        Ok(changes) => changes,
        Err(err) => {
            upload.discard().await;
            return Err(err);
        }
    };

    let updated = match state.documents().update(id, changes).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            upload.discard().await;
            return Err(document_not_found());
        }
        Err(err) => {
            upload.discard().await;
            return Err(internal_error(err));
        }
    };

    // The row already points at the new file, so the old one can go.
    if let Some(previous) = &updated.replaced_file {
        remove_stored_file(&state, &previous.file_name).await;
    }

    info!(%id, "document updated");
    Ok(Json(ApiData::with_message(
        updated.document,
        "Документ успешно обновлён",
    )))
}

async fn delete_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> ApiResult<Uuid> {
    let removed = state
        .documents()
        .delete(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(document_not_found)?;

    if let Some(file_name) = removed.file_name.as_deref() {
        remove_stored_file(&state, file_name).await;
    }

    info!(%id, "document deleted");
    Ok(Json(ApiData::with_message(id, "Документ удалён")))
}

async fn download_document(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Response, ApiError> {
    let document = state
        .documents()
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(document_not_found)?;

    let file_name = document
        .file_name
        .as_deref()
        .ok_or_else(|| not_found("У документа нет прикреплённого файла"))?;
    let path = resolve_within(&state.config().document_upload_dir(), file_name)
        .ok_or_else(|| not_found("Файл не найден"))?;

    stream_file(&path, file_name, content_type_for(file_name), true).await
}

async fn receive_form(state: &AppState, multipart: Multipart) -> Result<UploadOutcome, ApiError> {
    let dest_dir = state.config().document_upload_dir();
    let config = FileFieldConfig::new(FILE_FIELD, DOCUMENT_EXTENSIONS, MAX_DOCUMENT_BYTES);

    process_upload_form(multipart, &dest_dir, &[config])
        .await
        .map_err(|err| {
            warn!(%err, "document upload rejected");
            json_error(err.status(), err.to_string())
        })
}

fn new_document_from_form(upload: &UploadOutcome) -> Result<NewDocument, ApiError> {
    let (Some(title), Some(description), Some(category)) = (
        upload.text("title"),
        upload.text("description"),
        upload.text("category"),
    ) else {
        return Err(bad_request(
            "Обязательные поля: название, описание и категория",
        ));
    };

    let status = match upload.text("status") {
        Some(raw) => parse_status(raw)?,
        None => DocumentStatus::default(),
    };
    let expiry_date = match upload.first_text("expiryDate") {
        Some(raw) => parse_expiry(raw)?,
        None => None,
    };

    Ok(NewDocument {
        title: title.to_string(),
        description: description.to_string(),
        category: parse_category(category)?,
        status,
        expiry_date,
        file: stored_file_from(upload),
    })
}

fn changes_from_form(upload: &UploadOutcome) -> Result<DocumentChanges, ApiError> {
    let required_text = |field: &str, label: &str| -> Result<Option<String>, ApiError> {
        match upload.first_text(field) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => {
                Err(bad_request(format!("Поле «{label}» не может быть пустым")))
            }
            Some(raw) => Ok(Some(raw.trim().to_string())),
        }
    };

    Ok(DocumentChanges {
        title: required_text("title", "название")?,
        description: required_text("description", "описание")?,
        category: upload.text("category").map(parse_category).transpose()?,
        status: upload.text("status").map(parse_status).transpose()?,
        expiry_date: upload.first_text("expiryDate").map(parse_expiry).transpose()?,
        file: stored_file_from(upload),
    })
}

fn stored_file_from(upload: &UploadOutcome) -> Option<StoredFile> {
    upload.first_file_for(FILE_FIELD).map(|saved| StoredFile {
        file_url: format!("{DOCUMENT_URL_PREFIX}{}", saved.stored_name),
        file_name: saved.stored_name.clone(),
        file_size: format_file_size(saved.file_size),
    })
}

fn parse_category(raw: &str) -> Result<DocumentCategory, ApiError> {
    DocumentCategory::parse(raw)
        .ok_or_else(|| bad_request(format!("Неизвестная категория документа: {}", raw.trim())))
}

fn parse_status(raw: &str) -> Result<DocumentStatus, ApiError> {
    DocumentStatus::parse(raw)
        .ok_or_else(|| bad_request(format!("Неизвестный статус документа: {}", raw.trim())))
}

/// Empty input clears the date.
fn parse_expiry(raw: &str) -> Result<Option<NaiveDate>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|stamp| stamp.date_naive()))
        .map(Some)
        .map_err(|_| bad_request("Дата окончания должна быть в формате ГГГГ-ММ-ДД"))
}

async fn remove_stored_file(state: &AppState, file_name: &str) {
    match resolve_within(&state.config().document_upload_dir(), file_name) {
        Some(path) => remove_file_quietly(&path).await,
        None => warn!(file_name, "refusing to remove file outside upload directory"),
    }
}

fn document_not_found() -> ApiError {
    not_found("Документ не найден")
}
