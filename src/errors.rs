use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{error::DbErr, sqlx, RuntimeErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Simplified error structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Conflict",
    "message": "Rows in customers are still referenced by other tables",
    "details": {"dependencies": [{"table": "orders", "column": "customer_id", "count": 2}]},
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request", "Internal Server Error")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Table not found: carts")]
    pub message: String,
    /// Structured context, e.g. the dependency list of a refused delete
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// Integrity rule that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
    NotNull,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::Check => "check",
            Self::NotNull => "not null",
        };
        f.write_str(name)
    }
}

/// Rows in another table that still point at rows selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Dependency {
    pub table: String,
    pub column: String,
    pub count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rows in {table} are still referenced by other tables")]
    DependentRows {
        table: String,
        dependencies: Vec<Dependency>,
    },

    #[error("Constraint violation ({kind}): {message}")]
    ConstraintViolation {
        kind: ConstraintKind,
        message: String,
    },

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        ServiceError::db_error(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

/// Driver error code: SQLSTATE on PostgreSQL, extended result code on SQLite.
fn driver_code(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            e.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

fn driver_message(err: &DbErr) -> String {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => e.message().to_string(),
        other => other.to_string(),
    }
}

/// Classifies an integrity violation reported by the database.
pub fn constraint_kind(err: &DbErr) -> Option<ConstraintKind> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => return Some(ConstraintKind::Unique),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            return Some(ConstraintKind::ForeignKey)
        }
        _ => {}
    }
    match driver_code(err)?.as_str() {
        "23505" | "2067" | "1555" => Some(ConstraintKind::Unique),
        "23503" | "787" => Some(ConstraintKind::ForeignKey),
        "23514" | "275" => Some(ConstraintKind::Check),
        "23502" | "1299" => Some(ConstraintKind::NotNull),
        _ => None,
    }
}

/// SQLSTATE class 22: a value the column type cannot represent.
fn is_data_exception(code: &str) -> bool {
    code.len() == 5 && code.starts_with("22")
}

impl ServiceError {
    /// Wraps a database error, lifting integrity violations into
    /// `ConstraintViolation` and rejected values into `BadRequest`.
    pub fn db_error(err: DbErr) -> Self {
        if let Some(kind) = constraint_kind(&err) {
            return ServiceError::ConstraintViolation {
                kind,
                message: driver_message(&err),
            };
        }
        match driver_code(&err) {
            Some(code) if is_data_exception(&code) => {
                ServiceError::BadRequest(driver_message(&err))
            }
            _ => ServiceError::DatabaseError(err),
        }
    }

    /// Like `db_error`, but keeps the driver message for anything that is not
    /// an integrity violation. Used by the SQL console.
    pub fn query_error(err: DbErr) -> Self {
        match ServiceError::db_error(err) {
            ServiceError::DatabaseError(err) => ServiceError::QueryFailed(driver_message(&err)),
            other => other,
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) | Self::QueryFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DependentRows { .. } => StatusCode::CONFLICT,
            Self::ConstraintViolation { kind, .. } => match kind {
                ConstraintKind::Unique => StatusCode::CONFLICT,
                ConstraintKind::ForeignKey | ConstraintKind::Check | ConstraintKind::NotNull => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            Self::DatabaseError(_)
            | Self::MigrationError(_)
            | Self::InternalError(_)
            | Self::Io(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::MigrationError(_) | Self::InternalError(_) | Self::Io(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Structured context attached to the response body.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::DependentRows { table, dependencies } => Some(json!({
                "table": table,
                "dependencies": dependencies,
            })),
            Self::ConstraintViolation { kind, .. } => Some(json!({ "constraint": kind })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

pub type AppError = ServiceError;
