use axum::extract::State;
use serde::Serialize;

use crate::web::{
    AppState,
    responses::{ApiResult, internal_error, ok},
};

/// Figures for the admin panel header. Only `documents` is live; the rest are placeholders.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub students: u32,
    pub revenue: u64,
    pub applications: u32,
    pub conversion: f32,
    pub documents: i64,
}

impl QuickStats {
    pub fn with_document_count(documents: i64) -> Self {
        Self {
            students: 156,
            revenue: 2_450_000,
            applications: 23,
            conversion: 68.5,
            documents,
        }
    }
}

pub async fn quick_stats(State(state): State<AppState>) -> ApiResult<QuickStats> {
    let documents = state.documents().count().await.map_err(internal_error)?;
    ok(QuickStats::with_document_count(documents))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::web::testing::TestApp;

    #[tokio::test]
    async fn quick_stats_report_live_document_count() {
        let app = TestApp::new();
        let (status, body) = app.get_json("/api/admin/stats/quick").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["documents"], 0);
        assert_eq!(body["data"]["students"], 156);

        app.multipart(
            "/api/documents",
            &[("title", "Лицензия"), ("description", "скан"), ("category", "license")],
            None,
        )
        .await;

        let (_, body) = app.get_json("/api/admin/stats/quick").await;
        assert_eq!(body["data"]["documents"], 1);
    }
}
