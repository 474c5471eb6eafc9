use std::path::{Path, PathBuf};

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use crate::web::{AppState, responses::ApiError, responses::json_error};

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub download: Option<String>,
}

impl FileQuery {
    fn wants_attachment(&self) -> bool {
        matches!(self.download.as_deref(), Some("1" | "true" | "yes"))
    }
}

/// `GET|HEAD /uploads/documents/:file`
pub async fn serve_uploaded_document(
    State(state): State<AppState>,
    AxumPath(file): AxumPath<String>,
    Query(query): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let dir = state.config().document_upload_dir();
    serve_from(&dir, &file, query.wants_attachment()).await
}

/// `GET|HEAD /documents/:file` for documents shipped with the site.
pub async fn serve_public_document(
    State(state): State<AppState>,
    AxumPath(file): AxumPath<String>,
    Query(query): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let dir = state.config().public_documents_dir.clone();
    serve_from(&dir, &file, query.wants_attachment()).await
}

async fn serve_from(dir: &Path, file: &str, attachment: bool) -> Result<Response, ApiError> {
    let path = resolve_within(dir, file)
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Файл не найден"))?;
    stream_file(&path, file, content_type_for(file), attachment).await
}

/// Joins a single path segment onto `dir`, rejecting anything that could escape it.
pub fn resolve_within(dir: &Path, file: &str) -> Option<PathBuf> {
    if file.is_empty()
        || file.contains(['/', '\\'])
        || file == "."
        || file.contains("..")
        || sanitize_filename::sanitize(file) != file
    {
        return None;
    }
    Some(dir.join(file))
}

/// Content type chosen by file extension.
pub fn content_type_for(file: &str) -> mime::Mime {
    let extension = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => mime::APPLICATION_PDF,
        "doc" => parse_mime("application/msword"),
        "docx" => parse_mime(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "json" => mime::APPLICATION_JSON,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_mime(raw: &str) -> mime::Mime {
    raw.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Stream a file inline, or as an attachment when `attachment` is set.
pub async fn stream_file(
    path: &Path,
    filename: &str,
    content_type: mime::Mime,
    attachment: bool,
) -> Result<Response, ApiError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(json_error(StatusCode::NOT_FOUND, "Файл не найден"));
        }
        Err(err) => {
            error!(?err, file = %path.display(), "failed to read stored file");
            return Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Не удалось прочитать файл",
            ));
        }
    };

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(content_type.as_ref())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);
    let disposition = HeaderValue::from_str(&content_disposition(filename, attachment))
        .map_err(|_| json_error(StatusCode::INTERNAL_SERVER_ERROR, "Некорректное имя файла"))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, bytes).into_response())
}

/// Non-ASCII names go into `filename*` (RFC 5987) since header values must be ASCII.
fn content_disposition(filename: &str, attachment: bool) -> String {
    let kind = if attachment { "attachment" } else { "inline" };
    if filename.is_ascii() && !filename.contains('"') {
        return format!("{kind}; filename=\"{filename}\"");
    }

    let mut encoded = String::with_capacity(filename.len() * 3);
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("{kind}; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_traversal() {
        let dir = Path::new("/srv/uploads/documents");
        assert!(resolve_within(dir, "../secret.txt").is_none());
        assert!(resolve_within(dir, "a/b.pdf").is_none());
        assert!(resolve_within(dir, "").is_none());
        assert_eq!(
            resolve_within(dir, "charter_1.pdf"),
            Some(dir.join("charter_1.pdf"))
        );
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a.PDF"), mime::APPLICATION_PDF);
        assert_eq!(content_type_for("a.doc").as_ref(), "application/msword");
        assert_eq!(content_type_for("a.bin"), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn disposition_encodes_cyrillic_names() {
        assert_eq!(
            content_disposition("scan_1.pdf", false),
            "inline; filename=\"scan_1.pdf\""
        );
        assert_eq!(
            content_disposition("Устав.pdf", true),
            "attachment; filename*=UTF-8''%D0%A3%D1%81%D1%82%D0%B0%D0%B2.pdf"
        );
    }

    mod routes {
        use axum::http::{Method, StatusCode, header};

        use crate::web::testing::TestApp;

        fn disposition(response: &axum::response::Response) -> String {
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        }

        #[tokio::test]
        async fn head_on_uploaded_document_succeeds() {
            let app = TestApp::new();
            let (status, body) = app
                .multipart(
                    "/api/documents",
                    &[("title", "Лицензия"), ("description", "бессрочная"), ("category", "license")],
                    Some(("license.pdf", b"%PDF-1.4".to_vec())),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            let url = body["data"]["fileUrl"].as_str().unwrap().to_string();

            let response = app.request(Method::HEAD, &url, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                "application/pdf"
            );

            let response = app.request(Method::GET, &format!("{url}?download=1"), None).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(disposition(&response).starts_with("attachment"));
        }

        #[tokio::test]
        async fn public_documents_are_served_inline_or_as_attachment() {
            let app = TestApp::new();
            let dir = app.state().config().public_documents_dir.clone();
            tokio::fs::create_dir_all(&dir).await.unwrap();
            tokio::fs::write(dir.join("price_list.pdf"), b"%PDF-1.4 price")
                .await
                .unwrap();

            let response = app
                .request(Method::GET, "/documents/price_list.pdf", None)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(disposition(&response).starts_with("inline"));
            assert_eq!(TestApp::bytes(response).await, b"%PDF-1.4 price");

            let response = app
                .request(Method::GET, "/documents/price_list.pdf?download=1", None)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(disposition(&response).starts_with("attachment"));

            let response = app
                .request(Method::HEAD, "/documents/price_list.pdf", None)
                .await;
            assert_eq!(response.status(), StatusCode::OK);

            let response = app
                .request(Method::GET, "/documents/missing.pdf", None)
                .await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }
}
