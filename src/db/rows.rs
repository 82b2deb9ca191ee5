//! Generic row access over any catalog table.

use std::collections::BTreeMap;

use sea_orm::{ConnectionTrait, DatabaseConnection, Statement, TransactionTrait, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};
use utoipa::ToSchema;

use super::catalog::{self, find_column, require_table, ColumnInfo, ForeignKeyInfo};
use super::decode::{query_json, select_list};
use super::sql::{quote_ident, Binder};
use crate::errors::{Dependency, ServiceError};

/// Column name to JSON value, as sent by API clients.
pub type RowValues = Map<String, JsonValue>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteOutcome {
    /// Rows removed from the target table
    pub deleted: u64,
    /// Dependent rows removed first, per referencing column
    pub cascaded: Vec<Dependency>,
}

/// One dependent delete of a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeStep {
    pub table: String,
    pub column: String,
    pub predicate: String,
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

fn writable<'a>(
    table: &str,
    columns: &'a [ColumnInfo],
    name: &str,
) -> Result<&'a ColumnInfo, ServiceError> {
    let column = find_column(table, columns, name)?;
    if column.generated {
        return Err(ServiceError::ValidationError(format!(
            "Column {name} in table {table} is generated and cannot be written"
        )));
    }
    Ok(column)
}

/// Rejects values the column type cannot hold exactly.
fn check_value(table: &str, column: &ColumnInfo, value: &JsonValue) -> Result<(), ServiceError> {
    if !column.is_integer() {
        return Ok(());
    }
    let integral = match value {
        JsonValue::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        JsonValue::String(s) => s.trim().parse::<i64>().is_ok(),
        JsonValue::Null | JsonValue::Bool(_) => true,
        JsonValue::Array(_) | JsonValue::Object(_) => false,
    };
    if integral {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "Column {} in table {table} expects an integer, got {value}",
            column.name
        )))
    }
}

/// Renders `filter` as an AND of equality tests.
fn where_clause(
    binder: &mut Binder,
    table: &str,
    columns: &[ColumnInfo],
    filter: &RowValues,
) -> Result<String, ServiceError> {
    if filter.is_empty() {
        return Err(ServiceError::ValidationError(
            "A non-empty filter is required".to_string(),
        ));
    }
    let mut terms = Vec::with_capacity(filter.len());
    for (name, value) in filter {
        let column = find_column(table, columns, name)?;
        terms.push(binder.equals(column, value));
    }
    Ok(terms.join(" AND "))
}

/// A page of rows ordered by primary key when the table has one.
pub async fn fetch_page(
    db: &DatabaseConnection,
    table: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<JsonValue>, ServiceError> {
    require_table(db, table).await?;
    let columns = catalog::columns(db, table).await?;
    let backend = db.get_database_backend();

    let mut sql = format!(
        "SELECT {} FROM {}",
        select_list(backend, &columns),
        quote_ident(table)
    );
    let order: Vec<String> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| quote_ident(&c.name))
        .collect();
    if !order.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }
    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

    let rows = query_json(db, Statement::from_string(backend, sql), &columns).await?;
    Ok(rows)
}

/// Inserts one row and returns it as stored.
pub async fn insert(
    db: &DatabaseConnection,
    table: &str,
    values: &RowValues,
) -> Result<JsonValue, ServiceError> {
    require_table(db, table).await?;
    if values.is_empty() {
        return Err(ServiceError::ValidationError(
            "No values provided for insert".to_string(),
        ));
    }
    let columns = catalog::columns(db, table).await?;

    let mut binder = Binder::new(db.get_database_backend());
    let mut names = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (name, value) in values {
        let column = writable(table, &columns, name)?;
        check_value(table, column, value)?;
        names.push(quote_ident(&column.name));
        placeholders.push(binder.bind(column, value));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", "),
        select_list(binder.backend(), &columns)
    );
    let backend = binder.backend();
    let stmt = Statement::from_sql_and_values(backend, sql, binder.into_values());
    let rows = query_json(db, stmt, &columns).await?;

    debug!(table, "Inserted row");
    rows.into_iter()
        .next()
        .ok_or_else(|| ServiceError::InternalError(format!("INSERT into {table} returned no row")))
}

/// Updates the rows matching `filter` with the non-blank entries of `values`.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    table: &str,
    values: &RowValues,
    filter: &RowValues,
) -> Result<u64, ServiceError> {
    require_table(db, table).await?;
    let provided: Vec<(&String, &JsonValue)> =
        values.iter().filter(|(_, value)| !is_blank(value)).collect();
    if provided.is_empty() {
        return Err(ServiceError::ValidationError(
            "No values provided for update".to_string(),
        ));
    }
    let columns = catalog::columns(db, table).await?;

    let mut binder = Binder::new(db.get_database_backend());
    let mut assignments = Vec::with_capacity(provided.len());
    for (name, value) in provided {
        let column = writable(table, &columns, name)?;
        check_value(table, column, value)?;
        let placeholder = binder.bind(column, value);
        assignments.push(format!("{} = {}", quote_ident(&column.name), placeholder));
    }
    let predicate = where_clause(&mut binder, table, &columns, filter)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quote_ident(table),
        assignments.join(", "),
        predicate
    );
    let backend = binder.backend();
    let result = db
        .execute(Statement::from_sql_and_values(
            backend,
            sql,
            binder.into_values(),
        ))
        .await?;

    match result.rows_affected() {
        0 => Err(ServiceError::NotFound(format!(
            "No rows in {table} match the filter"
        ))),
        affected => Ok(affected),
    }
}

/// Dependent deletes needed before rows of `table` matching `predicate` can
/// go, deepest first. Tables already on the current path are not revisited.
pub fn cascade_plan(
    table: &str,
    predicate: &str,
    foreign_keys: &[ForeignKeyInfo],
) -> Vec<CascadeStep> {
    let mut plan = Vec::new();
    let mut path = vec![table.to_string()];
    collect_dependents(table, predicate, foreign_keys, &mut path, &mut plan);
    plan
}

fn collect_dependents(
    table: &str,
    predicate: &str,
    foreign_keys: &[ForeignKeyInfo],
    path: &mut Vec<String>,
    plan: &mut Vec<CascadeStep>,
) {
    for fk in foreign_keys.iter().filter(|fk| fk.foreign_table == table) {
        if path.contains(&fk.table) {
            continue;
        }
        let child_predicate = format!(
            "{} IN (SELECT {} FROM {} WHERE {})",
            quote_ident(&fk.column),
            quote_ident(&fk.foreign_column),
            quote_ident(table),
            predicate
        );
        path.push(fk.table.clone());
        collect_dependents(&fk.table, &child_predicate, foreign_keys, path, plan);
        path.pop();
        plan.push(CascadeStep {
            table: fk.table.clone(),
            column: fk.column.clone(),
            predicate: child_predicate,
        });
    }
}

/// Deletes the rows of `table` matching `filter`.
///
/// Without `cascade` the delete is refused while any other table still
/// references the matched rows. With `cascade` every dependent row is removed
/// first, all inside one transaction.
pub async fn delete(
    db: &DatabaseConnection,
    table: &str,
    filter: &RowValues,
    cascade: bool,
) -> Result<DeleteOutcome, ServiceError> {
    require_table(db, table).await?;
    let columns = catalog::columns(db, table).await?;

    let mut binder = Binder::new(db.get_database_backend());
    let predicate = where_clause(&mut binder, table, &columns, filter)?;
    let backend = binder.backend();
    let values: Vec<Value> = binder.into_values();

    let matched = catalog::count_where(db, table, Some(&predicate), values.clone()).await?;
    if matched == 0 {
        return Err(ServiceError::NotFound(format!(
            "No rows in {table} match the filter"
        )));
    }

    let foreign_keys = catalog::all_foreign_keys(db).await?;
    let delete_root = format!("DELETE FROM {} WHERE {}", quote_ident(table), predicate);

    if !cascade {
        let mut dependencies = Vec::new();
        for fk in foreign_keys
            .iter()
            .filter(|fk| fk.foreign_table == table && fk.table != table)
        {
            let child_predicate = format!(
                "{} IN (SELECT {} FROM {} WHERE {})",
                quote_ident(&fk.column),
                quote_ident(&fk.foreign_column),
                quote_ident(table),
                predicate
            );
            let count =
                catalog::count_where(db, &fk.table, Some(&child_predicate), values.clone())
                    .await?;
            if count > 0 {
                dependencies.push(Dependency {
                    table: fk.table.clone(),
                    column: fk.column.clone(),
                    count,
                });
            }
        }
        if !dependencies.is_empty() {
            return Err(ServiceError::DependentRows {
                table: table.to_string(),
                dependencies,
            });
        }

        let result = db
            .execute(Statement::from_sql_and_values(backend, delete_root, values))
            .await?;
        info!(table, deleted = result.rows_affected(), "Deleted rows");
        return Ok(DeleteOutcome {
            deleted: result.rows_affected(),
            cascaded: Vec::new(),
        });
    }

    let plan = cascade_plan(table, &predicate, &foreign_keys);
    let mut removed: BTreeMap<(String, String), u64> = BTreeMap::new();

    let txn = db.begin().await?;
    for step in plan {
        let sql = format!("DELETE FROM {} WHERE {}", quote_ident(&step.table), step.predicate);
        let result = txn
            .execute(Statement::from_sql_and_values(backend, sql, values.clone()))
            .await?;
        *removed.entry((step.table, step.column)).or_default() += result.rows_affected();
    }
    let result = txn
        .execute(Statement::from_sql_and_values(backend, delete_root, values))
        .await?;
    txn.commit().await?;

    let cascaded: Vec<Dependency> = removed
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|((table, column), count)| Dependency {
            table,
            column,
            count,
        })
        .collect();
    info!(
        table,
        deleted = result.rows_affected(),
        dependents = cascaded.len(),
        "Cascade-deleted rows"
    );
    Ok(DeleteOutcome {
        deleted: result.rows_affected(),
        cascaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fk(table: &str, column: &str, foreign_table: &str) -> ForeignKeyInfo {
        ForeignKeyInfo {
            table: table.into(),
            column: column.into(),
            foreign_table: foreign_table.into(),
            foreign_column: "id".into(),
        }
    }

    fn store_keys() -> Vec<ForeignKeyInfo> {
        vec![
            fk("orders", "customer_id", "customers"),
            fk("order_items", "order_id", "orders"),
            fk("order_items", "product_id", "products"),
            fk("reviews", "product_id", "products"),
            fk("reviews", "customer_id", "customers"),
        ]
    }

    #[test]
    fn cascade_deletes_grandchildren_first() {
        let plan = cascade_plan("customers", "\"id\" = ?", &store_keys());
        let tables: Vec<&str> = plan.iter().map(|s| s.table.as_str()).collect();
        assert_eq!(tables, vec!["order_items", "orders", "reviews"]);
        assert_eq!(
            plan[0].predicate,
            "\"order_id\" IN (SELECT \"id\" FROM \"orders\" WHERE \
             \"customer_id\" IN (SELECT \"id\" FROM \"customers\" WHERE \"id\" = ?))"
        );
    }

    #[test]
    fn leaf_tables_have_no_plan() {
        assert!(cascade_plan("reviews", "\"id\" = ?", &store_keys()).is_empty());
        assert!(cascade_plan("suppliers", "\"id\" = ?", &store_keys()).is_empty());
    }

    #[test]
    fn cycles_and_self_references_terminate() {
        let keys = vec![
            fk("employees", "manager_id", "employees"),
            fk("teams", "lead_id", "employees"),
            fk("employees", "team_id", "teams"),
        ];
        let plan = cascade_plan("employees", "\"id\" = ?", &keys);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].table, "teams");
    }

    #[test]
    fn integer_columns_reject_fractions() {
        let rating = ColumnInfo {
            name: "rating".into(),
            data_type: "integer".into(),
            udt_name: None,
            nullable: false,
            default: None,
            primary_key: false,
            generated: false,
        };
        assert!(check_value("reviews", &rating, &json!(4)).is_ok());
        assert!(check_value("reviews", &rating, &json!(4.0)).is_ok());
        assert!(check_value("reviews", &rating, &json!("5")).is_ok());
        assert!(check_value("reviews", &rating, &JsonValue::Null).is_ok());
        assert!(check_value("reviews", &rating, &json!(4.7)).is_err());
        assert!(check_value("reviews", &rating, &json!("4.7")).is_err());

        let comment = ColumnInfo {
            name: "comment".into(),
            data_type: "text".into(),
            ..rating
        };
        assert!(check_value("reviews", &comment, &json!(4.7)).is_ok());
    }

    #[test]
    fn blank_values_are_skipped() {
        assert!(is_blank(&JsonValue::Null));
        assert!(is_blank(&json!("")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!("x")));
    }
}
