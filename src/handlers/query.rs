use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{db::QueryOutcome, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"sql": "SELECT * FROM products WHERE price > ?", "params": [100]}))]
pub struct QueryRequest {
    /// A single SQL statement
    #[validate(length(min = 1, max = 100000))]
    pub sql: String,
    /// Positional parameters
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub params: Vec<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(run_query))
}

#[utoipa::path(
    post,
    path = "/api/v1/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Rows or affected count", body = QueryOutcome),
        (status = 400, description = "Empty statement or database error", body = crate::errors::ErrorResponse)
    ),
    tag = "Query"
)]
pub async fn run_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<ApiResponse<QueryOutcome>>, ServiceError> {
    payload.validate()?;
    let outcome = state
        .admin
        .execute_sql(&payload.sql, &payload.params)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
