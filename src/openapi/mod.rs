use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Admin API",
        version = "1.0.0",
        description = r#"
# Storefront Admin API

Administration of the retail store database: customers, products, suppliers,
orders, order items and reviews.

## Features

- **Catalog**: list tables with row counts, describe columns and foreign keys
- **Rows**: paginated reads, inserts, filtered updates and deletes
- **Deletes**: refused while other tables reference the rows, unless `cascade` is set
- **SQL console**: run a single statement with positional parameters
- **Bootstrap**: idempotent schema creation and sample data

## Error Handling

Errors share one body:

```json
{
  "error": "Conflict",
  "message": "Rows in customers are still referenced by other tables",
  "details": {"table": "customers", "dependencies": [{"table": "orders", "column": "customer_id", "count": 2}]},
  "request_id": "2f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Integrity violations map to `409` (unique) or `422` (foreign key, check, not null).

## Pagination

`GET /api/v1/tables/{table}/rows` takes `page` (clamped into the available range)
and `per_page` (default 200).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    tags(
        (name = "Tables", description = "Catalog and table management"),
        (name = "Rows", description = "Row reads and writes"),
        (name = "Query", description = "Raw SQL console"),
        (name = "Admin", description = "Schema bootstrap and reset")
    ),
    paths(
        crate::handlers::tables::list_tables,
        crate::handlers::tables::describe_table,
        crate::handlers::tables::drop_table,

        crate::handlers::rows::list_rows,
        crate::handlers::rows::insert_row,
        crate::handlers::rows::update_rows,
        crate::handlers::rows::delete_rows,

        crate::handlers::query::run_query,

        crate::handlers::admin::bootstrap,
        crate::handlers::admin::reset,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,

            crate::services::admin::TableOverview,
            crate::services::admin::TableSummary,
            crate::services::admin::RowPage,
            crate::services::admin::DatabaseStatus,
            crate::handlers::common::PaginationMeta,
            crate::db::TableDescription,
            crate::db::ColumnInfo,
            crate::db::ForeignKeyInfo,

            crate::handlers::rows::InsertRowRequest,
            crate::handlers::rows::UpdateRowsRequest,
            crate::handlers::rows::UpdateRowsResponse,
            crate::handlers::rows::DeleteRowsRequest,
            crate::db::DeleteOutcome,

            crate::handlers::query::QueryRequest,
            crate::db::QueryOutcome,

            crate::handlers::admin::ResetRequest,
            crate::handlers::admin::ResetResponse,
            crate::schema::BootstrapReport,
            crate::schema::SeededTable,

            crate::errors::ErrorResponse,
            crate::errors::Dependency,
            crate::errors::ConstraintKind
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_admin_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storefront Admin API"));
        assert!(json.contains("/api/v1/tables/{table}/rows"));
        assert!(json.contains("/api/v1/admin/reset"));
        assert!(json.contains("DeleteOutcome"));
    }
}
