use super::cursor::RowCursor;
use super::schema::{ColumnInfo, ColumnKind, TABLE_INFO_SQL, TABLE_NAMES_SQL, validate_table_name};
use super::table::Table;
use crate::error::{WebstoreError, WebstoreResult};
use sqlx::{Column as _, Executor as _, SqlitePool, Statement as _, TypeInfo as _};
use std::sync::Arc;

/// A resolved database: its name and a handle on the shared pool.
#[derive(Debug, Clone)]
pub struct Database {
    name: Arc<str>,
    pool: SqlitePool,
}

impl Database {
    pub fn new(name: impl Into<Arc<str>>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// User tables, sorted by name.
    pub async fn table_names(&self) -> WebstoreResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(TABLE_NAMES_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Resolves a table handle with a fresh schema snapshot. The table does not
    /// have to exist; check [`Table::exists`].
    pub async fn table(&self, name: &str) -> WebstoreResult<Table> {
        validate_table_name(name)?;
        let columns = sqlx::query_as::<_, ColumnInfo>(TABLE_INFO_SQL)
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        Ok(Table::new(
            self.name.to_string(),
            name.to_string(),
            self.pool.clone(),
            columns,
        ))
    }

    /// Runs arbitrary SQL and streams whatever it returns.
    ///
    /// The statement is prepared first so the column list is known even when no
    /// rows come back.
    pub async fn execute_sql<'a>(&'a self, sql: &'a str) -> WebstoreResult<RowCursor<'a>> {
        let statement = self
            .pool
            .prepare(sql)
            .await
            .map_err(WebstoreError::rejected)?;
        let (columns, kinds): (Vec<String>, Vec<ColumnKind>) = statement
            .columns()
            .iter()
            .map(|c| {
                (
                    c.name().to_string(),
                    ColumnKind::from_decl_type(c.type_info().name()),
                )
            })
            .unzip();
        Ok(RowCursor::new(
            columns,
            kinds,
            sqlx::query(sql).fetch(&self.pool),
        ))
    }
}
