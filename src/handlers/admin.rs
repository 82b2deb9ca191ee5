use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{errors::ServiceError, schema::BootstrapReport, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResetRequest {
    /// Must be `true`; every table is dropped
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Dropped tables in drop order
    pub dropped: Vec<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bootstrap", post(bootstrap))
        .route("/reset", post(reset))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/bootstrap",
    responses(
        (status = 200, description = "Schema ensured and sample rows seeded", body = BootstrapReport)
    ),
    tag = "Admin"
)]
pub async fn bootstrap(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BootstrapReport>>, ServiceError> {
    let report = state.admin.bootstrap().await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/reset",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "All tables dropped", body = ResetResponse),
        (status = 400, description = "Missing confirmation", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ApiResponse<ResetResponse>>, ServiceError> {
    let dropped = state.admin.reset(payload.confirm).await?;
    Ok(Json(ApiResponse::success(ResetResponse { dropped })))
}
