mod model;

use axum::{
    Json, Router,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

pub use model::{
    Application, ApplicationForm, BasicInfo, SchoolDirectory, StaffMember, Student,
};

use crate::{
    modules::records,
    web::{
        AppState,
        responses::{ApiData, ApiError, ApiResult, bad_request, not_found, ok},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/info/basic", get(get_basic_info).put(update_basic_info))
        .route("/api/staff", get(list_staff).post(create_staff))
        .route(
            "/api/staff/:id",
            put(update_staff).delete(delete_staff),
        )
        .route(
            "/api/admin/students",
            get(list_students).post(create_student),
        )
        .route(
            "/api/admin/students/:id",
            put(update_student).delete(delete_student),
        )
        .route("/api/applications/submit", post(submit_application))
        .route("/api/admin/applications", get(list_applications))
}

type Created<T> = Result<(StatusCode, Json<ApiData<T>>), ApiError>;

async fn get_basic_info(State(state): State<AppState>) -> ApiResult<BasicInfo> {
    ok(state.school().read().await.basic_info.clone())
}

async fn update_basic_info(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> ApiResult<BasicInfo> {
    let mut school = state.school().write().await;
    let updated: BasicInfo = records::merge_patch(&school.basic_info, patch)
        .and_then(serde_json::from_value)
        .map_err(invalid_payload)?;
    school.basic_info = updated;
    info!("basic info updated");
    ok(school.basic_info.clone())
}

async fn list_staff(State(state): State<AppState>) -> ApiResult<Vec<StaffMember>> {
    ok(state.school().read().await.staff.clone())
}

async fn create_staff(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Created<StaffMember> {
    let mut school = state.school().write().await;
    let member: StaffMember =
        records::insert_item(&mut school.staff, payload).map_err(invalid_payload)?;
    info!(id = member.id, "staff member added");
    Ok((
        StatusCode::CREATED,
        Json(ApiData::with_message(member, "Сотрудник добавлен")),
    ))
}

async fn update_staff(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(payload): Json<Value>,
) -> ApiResult<StaffMember> {
    let mut school = state.school().write().await;
    let member = records::update_item(&mut school.staff, id, payload)
        .map_err(invalid_payload)?
        .ok_or_else(|| not_found("Сотрудник не найден"))?;
    ok(member)
}

async fn delete_staff(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> ApiResult<StaffMember> {
    let mut school = state.school().write().await;
    let member = records::remove_item(&mut school.staff, id)
        .ok_or_else(|| not_found("Сотрудник не найден"))?;
    info!(id, "staff member removed");
    ok(member)
}

async fn list_students(State(state): State<AppState>) -> ApiResult<Vec<Student>> {
    ok(state.school().read().await.students.clone())
}

async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Created<Student> {
    let mut school = state.school().write().await;
    let student: Student =
        records::insert_item(&mut school.students, payload).map_err(invalid_payload)?;
    info!(id = student.id, "student enrolled");
    Ok((
        StatusCode::CREATED,
        Json(ApiData::with_message(student, "Ученик добавлен")),
    ))
}

async fn update_student(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(payload): Json<Value>,
) -> ApiResult<Student> {
    let mut school = state.school().write().await;
    let student = records::update_item(&mut school.students, id, payload)
        .map_err(invalid_payload)?
        .ok_or_else(|| not_found("Ученик не найден"))?;
    ok(student)
}

async fn delete_student(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> ApiResult<Student> {
    let mut school = state.school().write().await;
    let student = records::remove_item(&mut school.students, id)
        .ok_or_else(|| not_found("Ученик не найден"))?;
    info!(id, "student removed");
    ok(student)
}

async fn submit_application(
    State(state): State<AppState>,
    Json(form): Json<ApplicationForm>,
) -> Created<Application> {
    let application = state
        .school()
        .write()
        .await
        .submit_application(form, Utc::now())
        .map_err(bad_request)?;

    let recipient = state
        .config()
        .application_recipient
        .as_deref()
        .unwrap_or("-");
    info!(
        id = application.id,
        name = %application.name,
        phone = %application.phone,
        recipient,
        "application received"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiData::with_message(
            application,
            "Заявка отправлена. Мы свяжемся с вами в ближайшее время",
        )),
    ))
}

async fn list_applications(State(state): State<AppState>) -> ApiResult<Vec<Application>> {
    ok(state.school().read().await.recent_applications())
}

fn invalid_payload(err: serde_json::Error) -> ApiError {
    bad_request(format!("Некорректные данные: {err}"))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::web::testing::TestApp;

    #[tokio::test]
    async fn basic_info_update_keeps_unspecified_fields() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                Method::PUT,
                "/api/info/basic",
                json!({"phones": ["+7 (900) 999-99-99"]}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["phones"][0], "+7 (900) 999-99-99");
        assert_eq!(body["data"]["name"], "Автошкола РУЛЬ+");

        let (_, fetched) = app.get_json("/api/info/basic").await;
        assert_eq!(fetched["data"]["phones"][0], "+7 (900) 999-99-99");
    }

    #[tokio::test]
    async fn array_body_does_not_look_like_a_save() {
        let app = TestApp::new();
        let (status, body) = app.json(Method::PUT, "/api/staff/1", json!([1, 2])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let (status, _) = app
            .json(Method::PUT, "/api/info/basic", json!("name"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, staff) = app.get_json("/api/staff").await;
        assert_eq!(staff["data"][0]["name"], "Иванов Сергей Петрович");
    }

    #[tokio::test]
    async fn staff_crud_cycle() {
        let app = TestApp::new();
        let (status, created) = app
            .json(
                Method::POST,
                "/api/staff",
                json!({"name": "Орлов Дмитрий", "position": "Инструктор"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_u64().unwrap();

        let uri = format!("/api/staff/{id}");
        let (status, updated) = app
            .json(Method::PUT, &uri, json!({"experience": "5 лет"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["position"], "Инструктор");

        let (status, _) = app.json(Method::DELETE, &uri, json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.json(Method::PUT, &uri, json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn student_with_unknown_status_is_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                Method::POST,
                "/api/admin/students",
                json!({"fullName": "Тест", "phone": "1", "category": "B", "status": "on_vacation"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn application_without_phone_is_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .json(
                Method::POST,
                "/api/applications/submit",
                json!({"name": "Олег"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Укажите имя и телефон");
    }

    #[tokio::test]
    async fn submitted_application_is_listed_for_admin() {
        let app = TestApp::new();
        let (status, _) = app
            .json(
                Method::POST,
                "/api/applications/submit",
                json!({"name": "Олег", "phone": "+7 900 123-45-67", "category": "B"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, list) = app.get_json("/api/admin/applications").await;
        assert_eq!(list["data"][0]["name"], "Олег");
        assert_eq!(list["data"][0]["category"], "B");
    }
}
