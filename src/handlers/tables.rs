use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::IntoParams;

use crate::{
    db::TableDescription,
    errors::ServiceError,
    services::admin::TableOverview,
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TableListQuery {
    /// Also list the migration bookkeeping table
    #[serde(default)]
    pub include_internal: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tables))
        .route("/:table", get(describe_table).delete(drop_table))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables",
    params(TableListQuery),
    responses(
        (status = 200, description = "Tables with row counts", body = TableOverview)
    ),
    tag = "Tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Query(query): Query<TableListQuery>,
) -> Result<Json<ApiResponse<TableOverview>>, ServiceError> {
    let overview = state.admin.list_tables(query.include_internal).await?;
    Ok(Json(ApiResponse::success(overview)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{table}",
    params(("table" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Columns, keys and references", body = TableDescription),
        (status = 404, description = "Unknown table", body = crate::errors::ErrorResponse)
    ),
    tag = "Tables"
)]
pub async fn describe_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<TableDescription>>, ServiceError> {
    let description = state.admin.describe(&table).await?;
    Ok(Json(ApiResponse::success(description)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tables/{table}",
    params(("table" = String, Path, description = "Table name")),
    responses(
        (status = 200, description = "Table dropped"),
        (status = 404, description = "Unknown table", body = crate::errors::ErrorResponse)
    ),
    tag = "Tables"
)]
pub async fn drop_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    state.admin.drop_table(&table).await?;
    Ok(Json(ApiResponse::success(json!({ "dropped": table }))))
}
