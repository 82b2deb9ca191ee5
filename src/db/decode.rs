//! Result rows as JSON objects.
//!
//! PostgreSQL reports a type for every result column, so its rows go through
//! sea-orm's JSON decoding. SQLite only declares types for plain table
//! columns; its cells are decoded from each value's storage class instead.

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::sqlx::{self, sqlite::SqliteRow, Column, Row, Sqlite, TypeInfo, ValueRef};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, RuntimeErr, Statement,
    Value,
};
use serde_json::{Map, Number, Value as JsonValue};

use super::catalog::ColumnInfo;
use super::sql::quote_ident;

/// Select list naming every column of a table. SQLite reads fractional
/// columns back as text so stored decimals keep their exact digits.
pub fn select_list(backend: DbBackend, columns: &[ColumnInfo]) -> String {
    columns
        .iter()
        .map(|column| {
            let name = quote_ident(&column.name);
            if backend == DbBackend::Sqlite && column.is_fractional() {
                format!("CAST({name} AS TEXT) AS {name}")
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs `stmt` and returns one JSON object per row. `columns` describes the
/// table being read, when there is one; console statements pass none.
pub async fn query_json(
    db: &DatabaseConnection,
    stmt: Statement,
    columns: &[ColumnInfo],
) -> Result<Vec<JsonValue>, DbErr> {
    if db.get_database_backend() != DbBackend::Sqlite {
        return JsonValue::find_by_statement(stmt).all(db).await;
    }

    let Statement { sql, values, .. } = stmt;
    let mut query = sqlx::query::<Sqlite>(&sql);
    for value in values.map(|v| v.0).unwrap_or_default() {
        query = match value {
            Value::Bool(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::BigInt(v) => query.bind(v),
            Value::Double(v) => query.bind(v),
            Value::String(v) => query.bind(v.map(|s| *s)),
            other => {
                return Err(DbErr::Custom(format!(
                    "Unsupported SQLite parameter: {other:?}"
                )))
            }
        };
    }

    let rows = query
        .fetch_all(db.get_sqlite_connection_pool())
        .await
        .map_err(|e| DbErr::Query(RuntimeErr::SqlxError(e)))?;
    rows.iter().map(|row| sqlite_object(row, columns)).collect()
}

fn sqlite_object(row: &SqliteRow, columns: &[ColumnInfo]) -> Result<JsonValue, DbErr> {
    let mut object = Map::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let known = columns.iter().find(|c| c.name == name);
        let boolean = column.type_info().name() == "BOOLEAN"
            || known.is_some_and(ColumnInfo::is_boolean);

        let value = sqlite_cell(row, index, boolean)
            .map_err(|e| DbErr::Query(RuntimeErr::SqlxError(e)))?;
        let value = match value {
            JsonValue::String(text) if known.is_some_and(ColumnInfo::is_fractional) => {
                exact_decimal(text)
            }
            other => other,
        };
        object.insert(name.to_string(), value);
    }
    Ok(JsonValue::Object(object))
}

fn sqlite_cell(row: &SqliteRow, index: usize, boolean: bool) -> Result<JsonValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" if boolean => JsonValue::Bool(row.try_get::<bool, _>(index)?),
        "INTEGER" => JsonValue::from(row.try_get::<i64, _>(index)?),
        "REAL" => Number::from_f64(row.try_get::<f64, _>(index)?)
            .map_or(JsonValue::Null, JsonValue::Number),
        "BLOB" => {
            let bytes = row.try_get::<Vec<u8>, _>(index)?;
            JsonValue::String(bytes.iter().map(|b| format!("{b:02x}")).collect())
        }
        _ => JsonValue::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

/// Decimal text as rust_decimal serializes it. Anything unparseable is kept
/// verbatim.
fn exact_decimal(text: String) -> JsonValue {
    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(value) => JsonValue::String(value.to_string()),
        Err(_) => JsonValue::String(text),
    }
}
