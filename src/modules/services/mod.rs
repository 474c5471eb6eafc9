mod model;
mod seed;

use axum::{
    Json, Router,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::Value;
use tracing::info;

pub use model::{
    AdditionalService, ContractInfo, Discount, MainService, PaymentMethod, PaymentSchedule,
    ServicesCatalog,
};

use crate::{
    modules::records::{self, Record},
    web::{
        AppState,
        responses::{ApiData, ApiError, ApiResult, bad_request, not_found, ok},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(get_catalog))
        .route("/api/services/main", post(create_main_service))
        .route(
            "/api/services/main/:id",
            put(update_main_service).delete(delete_main_service),
        )
        .route("/api/services/additional", post(create_additional_service))
        .route(
            "/api/services/additional/:id",
            put(update_additional_service).delete(delete_additional_service),
        )
        .route("/api/services/payment-methods", put(replace_payment_methods))
        .route("/api/services/payment-schedule", put(replace_payment_schedule))
        .route("/api/services/discounts", post(create_discount))
        .route(
            "/api/services/discounts/:id",
            put(update_discount).delete(delete_discount),
        )
        .route("/api/services/contract-info", put(replace_contract_info))
}

type Select<T> = fn(&mut ServicesCatalog) -> &mut Vec<T>;
type Created<T> = Result<(StatusCode, Json<ApiData<T>>), ApiError>;

async fn get_catalog(State(state): State<AppState>) -> ApiResult<ServicesCatalog> {
    let catalog = state.catalog().read().await;
    ok(catalog.clone())
}

async fn create_main_service(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Created<MainService> {
    create_in(&state, |c| &mut c.main_services, payload, "Услуга добавлена").await
}

async fn update_main_service(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(payload): Json<Value>,
) -> ApiResult<MainService> {
    update_in(&state, |c| &mut c.main_services, id, payload, "Услуга не найдена").await
}

async fn delete_main_service(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> ApiResult<MainService> {
    delete_in(&state, |c| &mut c.main_services, id, "Услуга не найдена").await
}

async fn create_additional_service(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Created<AdditionalService> {
    create_in(
        &state,
        |c| &mut c.additional_services,
        payload,
        "Дополнительная услуга добавлена",
    )
    .await
}

async fn update_additional_service(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(payload): Json<Value>,
) -> ApiResult<AdditionalService> {
    update_in(
        &state,
        |c| &mut c.additional_services,
        id,
        payload,
        "Дополнительная услуга не найдена",
    )
    .await
}

async fn delete_additional_service(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> ApiResult<AdditionalService> {
    delete_in(
        &state,
        |c| &mut c.additional_services,
        id,
        "Дополнительная услуга не найдена",
    )
    .await
}

async fn create_discount(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Created<Discount> {
    create_in(&state, |c| &mut c.discounts, payload, "Скидка добавлена").await
}

async fn update_discount(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(payload): Json<Value>,
) -> ApiResult<Discount> {
    update_in(&state, |c| &mut c.discounts, id, payload, "Скидка не найдена").await
}

async fn delete_discount(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> ApiResult<Discount> {
    delete_in(&state, |c| &mut c.discounts, id, "Скидка не найдена").await
}

async fn replace_payment_methods(
    State(state): State<AppState>,
    Json(methods): Json<Vec<PaymentMethod>>,
) -> ApiResult<Vec<PaymentMethod>> {
    let mut catalog = state.catalog().write().await;
    catalog.payment_methods = methods;
    info!(count = catalog.payment_methods.len(), "payment methods replaced");
    ok(catalog.payment_methods.clone())
}

async fn replace_payment_schedule(
    State(state): State<AppState>,
    Json(schedule): Json<PaymentSchedule>,
) -> ApiResult<PaymentSchedule> {
    let total = schedule.total_percent();
    if !schedule.stages.is_empty() && total != 100 {
        return Err(bad_request(format!(
            "Сумма этапов оплаты должна быть 100%, получено {total}%"
        )));
    }

    let mut catalog = state.catalog().write().await;
    catalog.payment_schedule = schedule;
    info!(
        stages = catalog.payment_schedule.stages.len(),
        "payment schedule replaced"
    );
    ok(catalog.payment_schedule.clone())
}

async fn replace_contract_info(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> ApiResult<ContractInfo> {
    let mut catalog = state.catalog().write().await;
    let merged = records::merge_patch(&catalog.contract_info, patch)
        .and_then(serde_json::from_value::<ContractInfo>)
        .map_err(invalid_payload)?;
    catalog.contract_info = merged;
    ok(catalog.contract_info.clone())
}

async fn create_in<T: Record>(
    state: &AppState,
    select: Select<T>,
    payload: Value,
    message: &str,
) -> Created<T> {
    let mut catalog = state.catalog().write().await;
    let item = records::insert_item(select(&mut catalog), payload).map_err(invalid_payload)?;
    info!(id = item.id(), "catalog record created");
    Ok((
        StatusCode::CREATED,
        Json(ApiData::with_message(item, message)),
    ))
}

async fn update_in<T: Record>(
    state: &AppState,
    select: Select<T>,
    id: u64,
    payload: Value,
    missing: &str,
) -> ApiResult<T> {
    let mut catalog = state.catalog().write().await;
    let item = records::update_item(select(&mut catalog), id, payload)
        .map_err(invalid_payload)?
        .ok_or_else(|| not_found(missing))?;
    ok(item)
}

async fn delete_in<T: Record>(
    state: &AppState,
    select: Select<T>,
    id: u64,
    missing: &str,
) -> ApiResult<T> {
    let mut catalog = state.catalog().write().await;
    let item = records::remove_item(select(&mut catalog), id).ok_or_else(|| not_found(missing))?;
    info!(id, "catalog record deleted");
    ok(item)
}

fn invalid_payload(err: serde_json::Error) -> ApiError {
    bad_request(format!("Некорректные данные: {err}"))
}
