//! Helpers for building dynamic SQL over catalog-checked identifiers.

use sea_orm::{DbBackend, Value};
use serde_json::Value as JsonValue;

use super::catalog::ColumnInfo;
use crate::errors::ServiceError;

const MAX_IDENTIFIER_LEN: usize = 63;

/// Rejects names that could not be a plain table or column name. Callers
/// still check the name against the catalog before using it.
pub fn validate_identifier(identifier: &str) -> Result<&str, ServiceError> {
    if identifier.is_empty() || identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(ServiceError::ValidationError(format!(
            "Invalid identifier length: {identifier:?}"
        )));
    }
    if !identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ServiceError::ValidationError(format!(
            "Invalid characters in identifier: {identifier:?}"
        )));
    }
    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ServiceError::ValidationError(format!(
            "Identifier cannot start with a number: {identifier:?}"
        )));
    }
    Ok(identifier)
}

/// Double-quotes an identifier, escaping embedded quotes.
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Converts a JSON scalar into a driver value without any column context.
pub fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::String(None),
        JsonValue::Bool(b) => Value::Bool(Some(*b)),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::BigInt(Some(i)),
            (None, Some(f)) => Value::Double(Some(f)),
            (None, None) => Value::String(Some(Box::new(n.to_string()))),
        },
        JsonValue::String(s) => Value::String(Some(Box::new(s.clone()))),
        other => Value::String(Some(Box::new(other.to_string()))),
    }
}

/// Text form of a JSON value, used when PostgreSQL casts the parameter to the
/// column type.
fn json_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Collects bound values and renders backend-specific placeholders.
#[derive(Debug)]
pub struct Binder {
    backend: DbBackend,
    values: Vec<Value>,
}

impl Binder {
    pub fn new(backend: DbBackend) -> Self {
        Self {
            backend,
            values: Vec::new(),
        }
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    /// Binds `value` for `column` and returns the placeholder expression.
    pub fn bind(&mut self, column: &ColumnInfo, value: &JsonValue) -> String {
        match self.backend {
            DbBackend::Postgres => {
                self.values
                    .push(Value::String(json_to_text(value).map(Box::new)));
                format!("CAST(${} AS {})", self.values.len(), column.cast_type())
            }
            DbBackend::MySql | DbBackend::Sqlite => {
                self.values.push(json_to_value(value));
                "?".to_string()
            }
        }
    }

    /// `"column" = <placeholder>` or `"column" IS NULL` for JSON null.
    pub fn equals(&mut self, column: &ColumnInfo, value: &JsonValue) -> String {
        if value.is_null() {
            format!("{} IS NULL", quote_ident(&column.name))
        } else {
            let placeholder = self.bind(column, value);
            format!("{} = {}", quote_ident(&column.name), placeholder)
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Leading keywords of statements that produce a result set.
const ROW_RETURNING_KEYWORDS: [&str; 7] =
    ["SELECT", "WITH", "VALUES", "SHOW", "EXPLAIN", "TABLE", "PRAGMA"];

/// `sql` without leading whitespace, `-- line` and `/* block */` comments.
fn skip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map_or("", |end| &rest[end + 1..]);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.find("*/").map_or("", |end| &rest[end + 2..]);
        } else {
            return sql;
        }
    }
}

/// Whether a console statement should be run as a query returning rows.
pub fn returns_rows(sql: &str) -> bool {
    let upper = skip_leading_comments(sql).to_ascii_uppercase();
    let first = upper
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|word| !word.is_empty())
        .unwrap_or_default();
    ROW_RETURNING_KEYWORDS.contains(&first)
        || upper
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .any(|word| word == "RETURNING")
}
