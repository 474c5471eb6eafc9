//! In-process harness for router tests: a fresh in-memory state rooted in a temp dir.

use std::path::PathBuf;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    config::AppConfig,
    modules::documents::DocumentStore,
    web::{AppState, router::build_router},
};

const BOUNDARY: &str = "rulplus-test-boundary";

pub struct TestApp {
    router: Router,
    state: AppState,
    _root: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::for_tests(root.path());
        std::fs::create_dir_all(config.document_upload_dir()).expect("upload dir");
        std::fs::create_dir_all(&config.public_documents_dir).expect("public dir");
        let state = AppState::with_store(config, DocumentStore::in_memory());
        Self {
            router: build_router(state.clone()),
            state,
            _root: root,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.config().document_upload_dir()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn request(&self, method: Method, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        Self::read_json(self.send(request).await).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        Self::read_json(self.request(Method::GET, uri, None).await).await
    }

    pub async fn form(&self, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    /// POSTs a multipart form; `file` is sent as the `file` field.
    pub async fn multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, Vec<u8>)>,
    ) -> (StatusCode, Value) {
        self.multipart_with(Method::POST, uri, fields, file).await
    }

    pub async fn multipart_with(
        &self,
        method: Method,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, Vec<u8>)>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, file)))
            .expect("request");
        Self::read_json(self.send(request).await).await
    }

    pub async fn bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec()
    }

    pub async fn text(response: Response) -> String {
        String::from_utf8_lossy(&Self::bytes(response).await).into_owned()
    }

    async fn read_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = Self::bytes(response).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, Vec<u8>)>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
