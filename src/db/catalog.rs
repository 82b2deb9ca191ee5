//! Table catalog for PostgreSQL (`information_schema`) and SQLite
//! (`sqlite_master` and the `pragma_*` table functions).

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{ConnectionTrait, DbBackend, QueryResult, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use super::sql::{quote_ident, validate_identifier};
use crate::errors::ServiceError;

/// Bookkeeping table written by the migrator.
pub const MIGRATIONS_TABLE: &str = "seaql_migrations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    /// Underlying type name for array and user-defined types (PostgreSQL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udt_name: Option<String>,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    /// Stored generated column; not writable
    pub generated: bool,
}

impl ColumnInfo {
    /// Type name usable in `CAST(... AS <type>)`.
    pub fn cast_type(&self) -> &str {
        match (self.data_type.as_str(), self.udt_name.as_deref()) {
            ("ARRAY" | "USER-DEFINED", Some(udt)) => udt,
            (data_type, _) => data_type,
        }
    }

    /// Integer-typed column. SQLite gives INTEGER affinity to any declared
    /// type containing "INT".
    pub fn is_integer(&self) -> bool {
        let ty = self.data_type.to_ascii_lowercase();
        ty.contains("int") && !matches!(ty.as_str(), "interval" | "point")
    }

    /// Decimal or floating-point column.
    pub fn is_fractional(&self) -> bool {
        let ty = self.data_type.to_ascii_lowercase();
        ["numeric", "decimal", "real", "double", "float", "money"]
            .iter()
            .any(|prefix| ty.starts_with(prefix))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.data_type.to_ascii_lowercase().as_str(), "boolean" | "bool")
    }
}

/// A single-column foreign key: `table.column -> foreign_table.foreign_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ForeignKeyInfo {
    pub table: String,
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableDescription {
    pub name: String,
    pub row_count: u64,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    /// Foreign keys in other tables that point at this one
    pub referenced_by: Vec<ForeignKeyInfo>,
}

fn get<T: sea_orm::TryGetable>(row: &QueryResult, column: &str) -> Result<T, ServiceError> {
    row.try_get::<T>("", column)
        .map_err(|e| ServiceError::InternalError(format!("catalog column {column}: {e}")))
}

/// Base tables sorted by name. `seaql_migrations` is only listed when
/// `include_internal` is set.
pub async fn list_tables<C: ConnectionTrait>(
    db: &C,
    include_internal: bool,
) -> Result<Vec<String>, ServiceError> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DbBackend::Postgres => {
            "SELECT table_name::text AS table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name"
        }
        _ => {
            "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
    };
    let rows = db
        .query_all(Statement::from_string(backend, sql.to_string()))
        .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = get(&row, "table_name")?;
        if include_internal || name != MIGRATIONS_TABLE {
            tables.push(name);
        }
    }
    Ok(tables)
}

pub async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool, ServiceError> {
    Ok(list_tables(db, true).await?.iter().any(|t| t == table))
}

/// Checks the name's shape and that the table exists.
pub async fn require_table<C: ConnectionTrait>(db: &C, table: &str) -> Result<(), ServiceError> {
    validate_identifier(table)?;
    if table_exists(db, table).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("Table not found: {table}")))
    }
}

async fn primary_key_postgres<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<String>, ServiceError> {
    let sql = "SELECT kcu.column_name::text AS column_name \
               FROM information_schema.table_constraints tc \
               JOIN information_schema.key_column_usage kcu \
                 ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
               WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public' \
                 AND tc.table_name = $1 \
               ORDER BY kcu.ordinal_position";
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![table.into()],
        ))
        .await?;
    rows.iter().map(|row| get(row, "column_name")).collect()
}

/// Columns in ordinal order.
pub async fn columns<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<ColumnInfo>, ServiceError> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            let primary_key = primary_key_postgres(db, table).await?;
            let sql = "SELECT column_name::text AS column_name, data_type::text AS data_type, \
                              udt_name::text AS udt_name, is_nullable::text AS is_nullable, \
                              column_default::text AS column_default, \
                              is_generated::text AS is_generated \
                       FROM information_schema.columns \
                       WHERE table_schema = 'public' AND table_name = $1 \
                       ORDER BY ordinal_position";
            let rows = db
                .query_all(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql,
                    vec![table.into()],
                ))
                .await?;
            rows.iter()
                .map(|row| {
                    let name: String = get(row, "column_name")?;
                    let nullable: String = get(row, "is_nullable")?;
                    let generated: Option<String> = get(row, "is_generated")?;
                    Ok(ColumnInfo {
                        primary_key: primary_key.contains(&name),
                        name,
                        data_type: get(row, "data_type")?,
                        udt_name: get(row, "udt_name")?,
                        nullable: nullable == "YES",
                        default: get(row, "column_default")?,
                        generated: generated.as_deref() == Some("ALWAYS"),
                    })
                })
                .collect()
        }
        backend => {
            // hidden: 0 normal, 1 virtual-table hidden, 2/3 generated
            let sql = "SELECT name, type, \"notnull\" AS not_null, dflt_value, pk, hidden \
                       FROM pragma_table_xinfo(?) WHERE hidden <> 1 ORDER BY cid";
            let rows = db
                .query_all(Statement::from_sql_and_values(
                    backend,
                    sql,
                    vec![table.into()],
                ))
                .await?;
            rows.iter()
                .map(|row| {
                    let not_null: i32 = get(row, "not_null")?;
                    let pk: i32 = get(row, "pk")?;
                    let hidden: i32 = get(row, "hidden")?;
                    Ok(ColumnInfo {
                        name: get(row, "name")?,
                        data_type: get(row, "type")?,
                        udt_name: None,
                        nullable: not_null == 0 && pk == 0,
                        default: get(row, "dflt_value")?,
                        primary_key: pk > 0,
                        generated: hidden >= 2,
                    })
                })
                .collect()
        }
    }
}

/// Looks up a column by name, failing if the table does not have it.
pub fn find_column<'a>(
    table: &str,
    columns: &'a [ColumnInfo],
    name: &str,
) -> Result<&'a ColumnInfo, ServiceError> {
    validate_identifier(name)?;
    columns.iter().find(|c| c.name == name).ok_or_else(|| {
        ServiceError::ValidationError(format!("Unknown column {name} in table {table}"))
    })
}

/// Every foreign key in the schema.
pub async fn all_foreign_keys<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<ForeignKeyInfo>, ServiceError> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            let sql = "SELECT kcu.table_name::text AS table_name, \
                              kcu.column_name::text AS column_name, \
                              ccu.table_name::text AS foreign_table, \
                              ccu.column_name::text AS foreign_column \
                       FROM information_schema.table_constraints tc \
                       JOIN information_schema.key_column_usage kcu \
                         ON tc.constraint_name = kcu.constraint_name \
                        AND tc.table_schema = kcu.table_schema \
                       JOIN information_schema.constraint_column_usage ccu \
                         ON ccu.constraint_name = tc.constraint_name \
                        AND ccu.table_schema = tc.table_schema \
                       WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public' \
                       ORDER BY kcu.table_name, kcu.column_name";
            let rows = db
                .query_all(Statement::from_string(DbBackend::Postgres, sql.to_string()))
                .await?;
            rows.iter()
                .map(|row| {
                    Ok(ForeignKeyInfo {
                        table: get(row, "table_name")?,
                        column: get(row, "column_name")?,
                        foreign_table: get(row, "foreign_table")?,
                        foreign_column: get(row, "foreign_column")?,
                    })
                })
                .collect()
        }
        backend => {
            let mut keys = Vec::new();
            for table in list_tables(db, true).await? {
                let sql = "SELECT \"from\" AS column_name, \"table\" AS foreign_table, \
                                  COALESCE(\"to\", 'id') AS foreign_column \
                           FROM pragma_foreign_key_list(?) ORDER BY id, seq";
                let rows = db
                    .query_all(Statement::from_sql_and_values(
                        backend,
                        sql,
                        vec![table.clone().into()],
                    ))
                    .await?;
                for row in rows {
                    keys.push(ForeignKeyInfo {
                        table: table.clone(),
                        column: get(&row, "column_name")?,
                        foreign_table: get(&row, "foreign_table")?,
                        foreign_column: get(&row, "foreign_column")?,
                    });
                }
            }
            Ok(keys)
        }
    }
}

/// Outgoing references of `table`.
pub async fn foreign_keys<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<ForeignKeyInfo>, ServiceError> {
    Ok(all_foreign_keys(db)
        .await?
        .into_iter()
        .filter(|fk| fk.table == table)
        .collect())
}

/// Incoming references: foreign keys in other tables pointing at `table`.
pub async fn referencing<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<ForeignKeyInfo>, ServiceError> {
    Ok(all_foreign_keys(db)
        .await?
        .into_iter()
        .filter(|fk| fk.foreign_table == table && fk.table != table)
        .collect())
}

pub async fn row_count<C: ConnectionTrait>(db: &C, table: &str) -> Result<u64, ServiceError> {
    count_where(db, table, None, Vec::new()).await
}

/// `SELECT COUNT(*)` over `table`, optionally restricted by `predicate`.
pub async fn count_where<C: ConnectionTrait>(
    db: &C,
    table: &str,
    predicate: Option<&str>,
    values: Vec<sea_orm::Value>,
) -> Result<u64, ServiceError> {
    let backend = db.get_database_backend();
    let mut sql = format!("SELECT COUNT(*) AS row_count FROM {}", quote_ident(table));
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    let row = db
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?
        .ok_or_else(|| ServiceError::InternalError("COUNT returned no row".to_string()))?;
    let count: i64 = get(&row, "row_count")?;
    Ok(u64::try_from(count).unwrap_or_default())
}

pub async fn describe<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<TableDescription, ServiceError> {
    require_table(db, table).await?;

    let columns = columns(db, table).await?;
    let primary_key = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.clone())
        .collect();
    let (foreign_keys, referenced_by): (Vec<_>, Vec<_>) = all_foreign_keys(db)
        .await?
        .into_iter()
        .filter(|fk| fk.table == table || fk.foreign_table == table)
        .partition(|fk| fk.table == table);

    Ok(TableDescription {
        name: table.to_string(),
        row_count: row_count(db, table).await?,
        columns,
        primary_key,
        foreign_keys,
        referenced_by,
    })
}

/// Orders `tables` so that every table comes before the tables it references.
/// Tables caught in a reference cycle are appended in name order.
pub fn drop_order(tables: &[String], foreign_keys: &[ForeignKeyInfo]) -> Vec<String> {
    let mut remaining: BTreeSet<&str> = tables.iter().map(String::as_str).collect();
    let mut referenced_by: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for fk in foreign_keys {
        if fk.table != fk.foreign_table {
            referenced_by
                .entry(fk.foreign_table.as_str())
                .or_default()
                .insert(fk.table.as_str());
        }
    }

    let mut order = Vec::with_capacity(tables.len());
    loop {
        let ready: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|table| {
                referenced_by
                    .get(table)
                    .map(|children| children.iter().all(|child| !remaining.contains(child)))
                    .unwrap_or(true)
            })
            .collect();
        if ready.is_empty() {
            break;
        }
        for table in ready {
            remaining.remove(table);
            order.push(table.to_string());
        }
    }
    order.extend(remaining.into_iter().map(str::to_string));
    order
}
