use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    db::{self, catalog, rows, DeleteOutcome, QueryOutcome, RowValues, TableDescription},
    errors::{AppError, ServiceError},
    handlers::common::PaginationMeta,
    schema::{self, BootstrapReport},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableSummary {
    pub name: String,
    pub row_count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableOverview {
    pub tables: Vec<TableSummary>,
    pub total_records: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RowPage {
    pub table: String,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonValue>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseStatus {
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub tables: usize,
    pub total_records: u64,
}

/// Administrative operations over the store database.
#[derive(Debug, Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
    config: AppConfig,
}

impl AdminService {
    pub fn new(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        Self {
            db,
            config: config.clone(),
        }
    }

    pub async fn status(&self) -> Result<DatabaseStatus, AppError> {
        let backend = format!("{:?}", self.db.get_database_backend());
        let latency = match db::check_connection(&self.db).await {
            Ok(latency) => latency,
            Err(e) => {
                warn!(error = %e, "Database status check failed");
                return Ok(DatabaseStatus {
                    backend,
                    connected: false,
                    latency_ms: None,
                    tables: 0,
                    total_records: 0,
                });
            }
        };
        let overview = self.list_tables(false).await?;
        Ok(DatabaseStatus {
            backend,
            connected: true,
            latency_ms: Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)),
            tables: overview.tables.len(),
            total_records: overview.total_records,
        })
    }

    pub async fn list_tables(&self, include_internal: bool) -> Result<TableOverview, AppError> {
        let names = catalog::list_tables(&*self.db, include_internal).await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let row_count = catalog::row_count(&*self.db, &name).await?;
            tables.push(TableSummary { name, row_count });
        }
        let total_records = tables.iter().map(|t| t.row_count).sum();
        Ok(TableOverview {
            tables,
            total_records,
        })
    }

    pub async fn describe(&self, table: &str) -> Result<TableDescription, AppError> {
        catalog::describe(&*self.db, table).await
    }

    pub async fn rows_page(
        &self,
        table: &str,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<RowPage, AppError> {
        catalog::require_table(&*self.db, table).await?;
        let total = catalog::row_count(&*self.db, table).await?;
        let pagination = PaginationMeta::clamped(page, self.config.page_size(per_page), total);
        let rows = rows::fetch_page(&*self.db, table, pagination.per_page, pagination.offset())
            .await?;
        Ok(RowPage {
            table: table.to_string(),
            rows,
            pagination,
        })
    }

    #[instrument(skip(self, values))]
    pub async fn insert_row(&self, table: &str, values: &RowValues) -> Result<JsonValue, AppError> {
        rows::insert(&*self.db, table, values).await
    }

    #[instrument(skip(self, values, filter))]
    pub async fn update_rows(
        &self,
        table: &str,
        values: &RowValues,
        filter: &RowValues,
    ) -> Result<u64, AppError> {
        let updated = rows::update(&*self.db, table, values, filter).await?;
        info!(table, updated, "Updated rows");
        Ok(updated)
    }

    #[instrument(skip(self, filter))]
    pub async fn delete_rows(
        &self,
        table: &str,
        filter: &RowValues,
        cascade: bool,
    ) -> Result<DeleteOutcome, AppError> {
        rows::delete(&self.db, table, filter, cascade).await
    }

    #[instrument(skip(self))]
    pub async fn drop_table(&self, table: &str) -> Result<(), AppError> {
        db::admin::drop_table(&*self.db, table).await
    }

    /// Drops every table. Refused unless `confirm` is set.
    #[instrument(skip(self))]
    pub async fn reset(&self, confirm: bool) -> Result<Vec<String>, AppError> {
        if !confirm {
            return Err(ServiceError::BadRequest(
                "Reset drops every table; resend with \"confirm\": true".to_string(),
            ));
        }
        db::admin::reset_all(&self.db).await
    }

    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<BootstrapReport, AppError> {
        Ok(schema::bootstrap(&self.db).await?)
    }

    #[instrument(skip(self, params))]
    pub async fn execute_sql(
        &self,
        sql: &str,
        params: &[JsonValue],
    ) -> Result<QueryOutcome, AppError> {
        db::admin::execute_sql(&*self.db, sql, params).await
    }
}
