//! Destructive table management and the raw SQL console.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement, TransactionTrait};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::catalog::{self, require_table};
use super::decode::query_json;
use super::sql::{json_to_value, quote_ident, returns_rows};
use crate::errors::ServiceError;

/// Result of a console statement.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rows {
        #[schema(value_type = Vec<Object>)]
        rows: Vec<JsonValue>,
        count: usize,
    },
    Executed {
        rows_affected: u64,
    },
}

fn drop_statement(backend: DbBackend, table: &str) -> Statement {
    let cascade = match backend {
        DbBackend::Postgres => " CASCADE",
        _ => "",
    };
    Statement::from_string(
        backend,
        format!("DROP TABLE IF EXISTS {}{cascade}", quote_ident(table)),
    )
}

pub async fn drop_table<C: ConnectionTrait>(db: &C, table: &str) -> Result<(), ServiceError> {
    require_table(db, table).await?;
    db.execute(drop_statement(db.get_database_backend(), table))
        .await?;
    warn!(table, "Dropped table");
    Ok(())
}

/// Drops every table, migration bookkeeping included, dependents first.
/// Returns the dropped names in drop order.
pub async fn reset_all(db: &DatabaseConnection) -> Result<Vec<String>, ServiceError> {
    let backend = db.get_database_backend();
    let txn = db.begin().await?;

    let tables = catalog::list_tables(&txn, true).await?;
    let foreign_keys = catalog::all_foreign_keys(&txn).await?;
    let order = catalog::drop_order(&tables, &foreign_keys);
    for table in &order {
        txn.execute(drop_statement(backend, table)).await?;
    }
    txn.commit().await?;

    warn!(tables = order.len(), "Dropped all tables");
    Ok(order)
}

/// Runs one operator-supplied statement with positional parameters.
pub async fn execute_sql(
    db: &DatabaseConnection,
    sql: &str,
    params: &[JsonValue],
) -> Result<QueryOutcome, ServiceError> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(ServiceError::ValidationError(
            "SQL statement is empty".to_string(),
        ));
    }
    let values = params.iter().map(json_to_value).collect::<Vec<_>>();
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);

    if returns_rows(sql) {
        let rows = query_json(db, stmt, &[])
            .await
            .map_err(ServiceError::query_error)?;
        info!(rows = rows.len(), "Console query");
        Ok(QueryOutcome::Rows {
            count: rows.len(),
            rows,
        })
    } else {
        let result = db.execute(stmt).await.map_err(ServiceError::query_error)?;
        info!(rows_affected = result.rows_affected(), "Console statement");
        Ok(QueryOutcome::Executed {
            rows_affected: result.rows_affected(),
        })
    }
}
