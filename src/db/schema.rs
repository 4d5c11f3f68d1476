//! Runtime schema snapshots and identifier handling.

use crate::error::{WebstoreError, WebstoreResult};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// One column as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty when the column is untyped.
    pub decl_type: String,
}

impl ColumnInfo {
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_decl_type(&self.decl_type)
    }
}

/// How stored values of a column are turned back into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Plain,
    Boolean,
    Json,
}

impl ColumnKind {
    pub fn from_decl_type(decl_type: &str) -> Self {
        let upper = decl_type.trim().to_ascii_uppercase();
        if upper.starts_with("BOOL") {
            ColumnKind::Boolean
        } else if upper == "JSON" {
            ColumnKind::Json
        } else {
            ColumnKind::Plain
        }
    }
}

pub(crate) const TABLE_INFO_SQL: &str =
    "SELECT name, type AS decl_type FROM pragma_table_info(?) ORDER BY cid";

pub(crate) const TABLE_NAMES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name";

/// Declared type for a new column, guessed from its first value.
pub(crate) fn column_type_for(value: &Value) -> &'static str {
    match value {
        Value::Null => "",
        Value::Bool(_) => "BOOLEAN",
        Value::Number(n) if n.is_i64() => "INTEGER",
        Value::Number(_) => "REAL",
        Value::String(_) => "TEXT",
        Value::Array(_) | Value::Object(_) => "JSON",
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn column_def(column: &ColumnInfo) -> String {
    if column.decl_type.is_empty() {
        quote_ident(&column.name)
    } else {
        format!("{} {}", quote_ident(&column.name), column.decl_type)
    }
}

/// Database names map to file names, so only a conservative alphabet is allowed.
pub fn validate_database_name(name: &str) -> WebstoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(WebstoreError::InvalidParameter(format!(
            "{name} (database names may only contain letters, digits, '_' and '-')"
        )))
    }
}

pub fn validate_table_name(name: &str) -> WebstoreResult<()> {
    if name.is_empty() {
        return Err(WebstoreError::InvalidParameter(
            "table name is empty".to_string(),
        ));
    }
    if name.contains(['.', '/']) {
        return Err(WebstoreError::InvalidParameter(format!(
            "{name} (table names may not contain '.' or '/')"
        )));
    }
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(WebstoreError::InvalidParameter(format!(
            "{name} (reserved table name)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident("x; DROP TABLE t"), "\"x; DROP TABLE t\"");
    }

    #[test]
    fn column_types_follow_first_value() {
        assert_eq!(column_type_for(&json!(1)), "INTEGER");
        assert_eq!(column_type_for(&json!(1.5)), "REAL");
        assert_eq!(column_type_for(&json!(u64::MAX)), "REAL");
        assert_eq!(column_type_for(&json!("a")), "TEXT");
        assert_eq!(column_type_for(&json!(true)), "BOOLEAN");
        assert_eq!(column_type_for(&json!([1])), "JSON");
        assert_eq!(column_type_for(&Value::Null), "");
    }

    #[test]
    fn column_kind_reads_declared_type() {
        assert_eq!(ColumnKind::from_decl_type("boolean"), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_decl_type("JSON"), ColumnKind::Json);
        assert_eq!(ColumnKind::from_decl_type("VARCHAR(20)"), ColumnKind::Plain);
        assert_eq!(ColumnKind::from_decl_type(""), ColumnKind::Plain);
    }

    #[test]
    fn names_are_validated() {
        assert!(validate_database_name("main_2024-x").is_ok());
        assert!(validate_database_name("../etc").is_err());
        assert!(validate_database_name("").is_err());

        assert!(validate_table_name("people").is_ok());
        assert!(validate_table_name("with space").is_ok());
        assert!(validate_table_name("a.b").is_err());
        assert!(validate_table_name("sqlite_master").is_err());
    }
}
