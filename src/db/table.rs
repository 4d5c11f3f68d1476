//! Table gateway: reads and staged writes against one table whose schema is
//! only known at runtime.

use super::cursor::RowCursor;
use super::predicate::Predicate;
use super::schema::{ColumnInfo, column_def, column_type_for, quote_ident};
use super::value::{SqlBuf, SqlValue};
use crate::error::{WebstoreError, WebstoreResult};
use crate::query::{QueryParams, SortKey};
use ahash::AHashSet;
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use webstore_schema::Row;

/// Request-scoped handle on a table that may or may not exist yet.
///
/// Writes are staged in a transaction opened by the first write. Nothing is
/// visible to other connections until [`Table::commit`]; dropping the handle
/// without committing rolls the whole batch back.
pub struct Table {
    database: String,
    name: String,
    pool: SqlitePool,
    columns: Vec<ColumnInfo>,
    pending: Option<Transaction<'static, Sqlite>>,
}

/// A prepared read. Fetching it yields a [`RowCursor`].
#[derive(Debug, Clone)]
pub struct Select {
    sql: SqlBuf,
    columns: Vec<ColumnInfo>,
}

impl Select {
    pub fn sql(&self) -> &str {
        self.sql.sql()
    }
}

impl Table {
    pub(crate) fn new(
        database: String,
        name: String,
        pool: SqlitePool,
        columns: Vec<ColumnInfo>,
    ) -> Self {
        Self {
            database,
            name,
            pool,
            columns,
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn exists(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Resolves filter parameters against the schema snapshot.
    pub fn build_predicate(&self, filters: &QueryParams) -> WebstoreResult<Predicate> {
        Predicate::from_params(filters, |column| {
            self.columns
                .iter()
                .find(|c| c.name == column)
                .map(ColumnInfo::kind)
        })
    }

    /// Builds a single read. Sort columns must exist in the table.
    pub fn select(
        &self,
        predicate: &Predicate,
        sort: &[SortKey],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> WebstoreResult<Select> {
        if !self.exists() {
            return Err(WebstoreError::TableNotFound(self.name.clone()));
        }
        if let Some(key) = sort.iter().find(|key| !self.has_column(&key.column)) {
            return Err(WebstoreError::UnknownColumn(key.column.clone()));
        }

        let projection = self
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = SqlBuf::new(format!(
            "SELECT {projection} FROM {}",
            quote_ident(&self.name)
        ));
        predicate.write_where(&mut sql);

        for (i, key) in sort.iter().enumerate() {
            sql.push(if i == 0 { " ORDER BY " } else { ", " })
                .push(&quote_ident(&key.column))
                .push(" ")
                .push(key.direction.as_sql());
        }

        if limit.is_some() || offset.is_some() {
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
            let limit = limit.map_or(-1, saturating_i64);
            sql.push(" LIMIT ").push_bind(SqlValue::Integer(limit));
            if let Some(offset) = offset {
                sql.push(" OFFSET ")
                    .push_bind(SqlValue::Integer(saturating_i64(offset)));
            }
        }

        debug!(
            database = %self.database,
            table = %self.name,
            sql = %sql.sql(),
            binds = sql.binds().len(),
            "select built"
        );

        Ok(Select {
            sql,
            columns: self.columns.clone(),
        })
    }

    /// Executes a prepared read against the pool.
    pub fn fetch<'a>(&'a self, select: &'a Select) -> RowCursor<'a> {
        let columns = select.columns.iter().map(|c| c.name.clone()).collect();
        let kinds = select.columns.iter().map(ColumnInfo::kind).collect();
        RowCursor::new(columns, kinds, select.sql.query().fetch(&self.pool))
    }

    /// Appends a row, creating the table or missing columns as needed.
    /// An empty row is a no-op.
    pub async fn add_row(&mut self, row: &Row) -> WebstoreResult<()> {
        if row.is_empty() {
            return Ok(());
        }
        self.ensure_columns(row).await?;
        self.insert(row).await
    }

    /// Updates the one row whose `unique` columns equal those of `row`,
    /// inserting when nothing matches. Returns `true` if an update happened.
    ///
    /// Keys compare with `=`, so a null key never matches and the row is
    /// inserted. With no unique columns the row is always inserted. Keys that
    /// match more than one row are rejected and nothing is written.
    pub async fn upsert_row(&mut self, unique: &[String], row: &Row) -> WebstoreResult<bool> {
        if row.is_empty() {
            return Ok(false);
        }
        if unique.is_empty() {
            self.add_row(row).await?;
            return Ok(false);
        }
        if let Some(missing) = unique.iter().find(|key| !row.contains_key(*key)) {
            return Err(WebstoreError::InvalidParameter(format!(
                "{missing} (unique column missing from row)"
            )));
        }
        self.ensure_columns(row).await?;

        if unique.iter().any(|key| row[key].is_null()) {
            self.insert(row).await?;
            return Ok(false);
        }

        let table = quote_ident(&self.name);
        let mut lookup = SqlBuf::new(format!("SELECT COUNT(*) FROM {table}"));
        write_key_match(&mut lookup, unique, row);
        let tx = self.transaction().await?;
        let matched = lookup.fetch_i64(tx).await.map_err(WebstoreError::rejected)?;

        match matched {
            0 => {
                self.insert(row).await?;
                Ok(false)
            }
            1 => {
                let assignments: Vec<(&String, &Value)> = row
                    .iter()
                    .filter(|(column, _)| !unique.contains(*column))
                    .collect();
                if assignments.is_empty() {
                    return Ok(true);
                }
                let mut sql = SqlBuf::new(format!("UPDATE {table} SET "));
                for (i, (column, value)) in assignments.iter().enumerate() {
                    if i > 0 {
                        sql.push(", ");
                    }
                    sql.push(&quote_ident(column))
                        .push(" = ")
                        .push_bind(SqlValue::from(*value));
                }
                write_key_match(&mut sql, unique, row);
                let tx = self.transaction().await?;
                sql.execute(tx).await.map_err(WebstoreError::rejected)?;
                Ok(true)
            }
            n => Err(WebstoreError::InvalidParameter(format!(
                "{} (unique columns match {n} rows)",
                unique.join(",")
            ))),
        }
    }

    /// Drops the table. Staged like any other write.
    pub async fn drop_table(&mut self) -> WebstoreResult<()> {
        if !self.exists() {
            return Err(WebstoreError::TableNotFound(self.name.clone()));
        }
        let sql = SqlBuf::new(format!("DROP TABLE {}", quote_ident(&self.name)));
        let tx = self.transaction().await?;
        sql.execute(tx).await.map_err(WebstoreError::rejected)?;
        self.columns.clear();
        Ok(())
    }

    /// Makes staged writes durable. A no-op when nothing was written.
    pub async fn commit(&mut self) -> WebstoreResult<()> {
        if let Some(tx) = self.pending.take() {
            tx.commit().await?;
            debug!(database = %self.database, table = %self.name, "table writes committed");
        }
        Ok(())
    }

    async fn transaction(&mut self) -> WebstoreResult<&mut sqlx::SqliteConnection> {
        let tx = match self.pending.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(&mut **self.pending.insert(tx))
    }

    async fn insert(&mut self, row: &Row) -> WebstoreResult<()> {
        let columns = row
            .keys()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = SqlBuf::new(format!(
            "INSERT INTO {} ({columns}) VALUES (",
            quote_ident(&self.name)
        ));
        for (i, value) in row.values().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_bind(SqlValue::from(value));
        }
        sql.push(")");

        let tx = self.transaction().await?;
        sql.execute(tx).await.map_err(WebstoreError::rejected)?;
        Ok(())
    }

    /// Creates the table, or adds the columns of `row` it does not have yet.
    async fn ensure_columns(&mut self, row: &Row) -> WebstoreResult<()> {
        if row.keys().any(String::is_empty) {
            return Err(WebstoreError::InvalidParameter(
                "column name is empty".to_string(),
            ));
        }

        let missing: Vec<ColumnInfo> = {
            let known: AHashSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
            row.iter()
                .filter(|(column, _)| !known.contains(column.as_str()))
                .map(|(column, value)| ColumnInfo {
                    name: column.clone(),
                    decl_type: column_type_for(value).to_string(),
                })
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        let table = quote_ident(&self.name);
        let statements: Vec<String> = if self.exists() {
            missing
                .iter()
                .map(|c| format!("ALTER TABLE {table} ADD COLUMN {}", column_def(c)))
                .collect()
        } else {
            let defs = missing.iter().map(column_def).collect::<Vec<_>>().join(", ");
            vec![format!("CREATE TABLE {table} ({defs})")]
        };

        let creating = !self.exists();
        let tx = self.transaction().await?;
        for statement in &statements {
            if let Err(e) = sqlx::query(statement).execute(&mut *tx).await {
                // Another request created the table after our schema snapshot.
                return Err(if creating && is_already_exists(&e) {
                    WebstoreError::TableAlreadyExists {
                        table: self.name.clone(),
                        url: resource_url(&self.database, &self.name),
                    }
                } else {
                    WebstoreError::rejected(e)
                });
            }
        }

        debug!(
            database = %self.database,
            table = %self.name,
            added = missing.len(),
            created = creating,
            "table schema extended"
        );
        self.columns.extend(missing);
        Ok(())
    }
}

/// Canonical link to a table resource.
pub fn resource_url(database: &str, table: &str) -> String {
    format!("/db/{database}/{table}")
}

fn write_key_match(sql: &mut SqlBuf, unique: &[String], row: &Row) {
    for (i, key) in unique.iter().enumerate() {
        sql.push(if i == 0 { " WHERE " } else { " AND " })
            .push(&quote_ident(key))
            .push(" = ")
            .push_bind(SqlValue::from(&row[key]));
    }
}

fn is_already_exists(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("already exists"))
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
