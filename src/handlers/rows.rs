use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::common::PaginationParams;
use crate::{
    db::{DeleteOutcome, RowValues},
    errors::ServiceError,
    services::admin::RowPage,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"values": {"company_name": "Acme Parts", "email": "sales@acme.test"}}))]
pub struct InsertRowRequest {
    /// Column values for the new row
    #[schema(value_type = Object)]
    pub values: RowValues,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"values": {"stock_quantity": 40}, "filter": {"id": 2}}))]
pub struct UpdateRowsRequest {
    /// New values; null and empty strings are ignored
    #[schema(value_type = Object)]
    pub values: RowValues,
    /// Equality conditions, all of which must hold
    #[schema(value_type = Object)]
    pub filter: RowValues,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"filter": {"id": 1}, "cascade": false}))]
pub struct DeleteRowsRequest {
    #[schema(value_type = Object)]
    pub filter: RowValues,
    /// Remove dependent rows in other tables first
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateRowsResponse {
    pub table: String,
    pub updated: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:table/rows", get(list_rows).post(insert_row).patch(update_rows))
        .route("/:table/rows/delete", post(delete_rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{table}/rows",
    params(
        ("table" = String, Path, description = "Table name"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "One page of rows", body = RowPage),
        (status = 404, description = "Unknown table", body = crate::errors::ErrorResponse)
    ),
    tag = "Rows"
)]
pub async fn list_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<RowPage>>, ServiceError> {
    let page = state
        .admin
        .rows_page(&table, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables/{table}/rows",
    params(("table" = String, Path, description = "Table name")),
    request_body = InsertRowRequest,
    responses(
        (status = 201, description = "Row inserted; body holds the stored row"),
        (status = 400, description = "Unknown column or no values", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unique constraint violated", body = crate::errors::ErrorResponse),
        (status = 422, description = "Check, foreign key or not-null constraint violated", body = crate::errors::ErrorResponse)
    ),
    tag = "Rows"
)]
pub async fn insert_row(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<InsertRowRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ServiceError> {
    let row = state.admin.insert_row(&table, &payload.values).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tables/{table}/rows",
    params(("table" = String, Path, description = "Table name")),
    request_body = UpdateRowsRequest,
    responses(
        (status = 200, description = "Rows updated", body = UpdateRowsResponse),
        (status = 400, description = "Nothing to update or empty filter", body = crate::errors::ErrorResponse),
        (status = 404, description = "No matching rows", body = crate::errors::ErrorResponse)
    ),
    tag = "Rows"
)]
pub async fn update_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<UpdateRowsRequest>,
) -> Result<Json<ApiResponse<UpdateRowsResponse>>, ServiceError> {
    let updated = state
        .admin
        .update_rows(&table, &payload.values, &payload.filter)
        .await?;
    Ok(Json(ApiResponse::success(UpdateRowsResponse {
        table,
        updated,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables/{table}/rows/delete",
    params(("table" = String, Path, description = "Table name")),
    request_body = DeleteRowsRequest,
    responses(
        (status = 200, description = "Rows deleted", body = DeleteOutcome),
        (status = 404, description = "No matching rows", body = crate::errors::ErrorResponse),
        (status = 409, description = "Rows still referenced; details list the dependencies", body = crate::errors::ErrorResponse)
    ),
    tag = "Rows"
)]
pub async fn delete_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<DeleteRowsRequest>,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ServiceError> {
    let outcome = state
        .admin
        .delete_rows(&table, &payload.filter, payload.cascade)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
