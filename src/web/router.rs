use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    modules,
    web::{
        AppState, admin, auth, landing, storage,
        uploads::{MAX_DOCUMENT_BYTES, MIB},
    },
};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

/// Multipart framing and text fields on top of the largest accepted file.
const REQUEST_BODY_LIMIT: usize = (MAX_DOCUMENT_BYTES + MIB) as usize;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config().cors_origin.as_deref());

    Router::new()
        .route("/", get(landing::landing_page))
        .route("/documents", get(landing::documents_page))
        .route("/documents/:file", get(storage::serve_public_document))
        .route(
            "/uploads/documents/:file",
            get(storage::serve_uploaded_document),
        )
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/login",
            get(auth::login_page).post(auth::process_login),
        )
        .route("/admin/logout", get(auth::logout).post(auth::logout))
        .route("/api/admin/login", post(auth::api_login))
        .route("/api/admin/stats/quick", get(admin::quick_stats))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .merge(modules::documents::router())
        .merge(modules::services::router())
        .merge(modules::school::router())
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(err)) => {
            warn!(?err, "CORS_ORIGIN is not a valid header value; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
