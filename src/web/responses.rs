use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;

/// Canonical JSON payload for error responses: `{"status":"error","message":...}`.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub status: &'static str,
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// Success envelope: `{"status":"success","data":...}`.
#[derive(Debug, Serialize, Clone)]
pub struct ApiData<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data,
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiMessage>);
pub type ApiResult<T> = Result<Json<ApiData<T>>, ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiData::new(data)))
}

/// Helper for controllers that need to return `(StatusCode, Json<ApiMessage>)`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiMessage::new(message)))
}

/// Logs the underlying failure and hands the client a generic 500.
pub fn internal_error(err: impl std::fmt::Debug) -> ApiError {
    error!(?err, "request failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Внутренняя ошибка сервера",
    )
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    json_error(StatusCode::NOT_FOUND, message)
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    json_error(StatusCode::BAD_REQUEST, message)
}
