//! Binding JSON values to dynamically built statements.

use serde_json::Value;
use sqlx::{
    Row as _, Sqlite, SqliteConnection,
    query::Query,
    sqlite::{SqliteArguments, SqliteQueryResult},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            other @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(other.to_string()),
        }
    }
}

impl SqlValue {
    fn bind<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Bool(v) => query.bind(*v),
        }
    }
}

/// SQL text plus positional parameters, assembled piece by piece.
#[derive(Debug, Clone, Default)]
pub(crate) struct SqlBuf {
    sql: String,
    binds: Vec<SqlValue>,
}

impl SqlBuf {
    pub(crate) fn new(head: impl Into<String>) -> Self {
        Self {
            sql: head.into(),
            binds: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub(crate) fn push_bind(&mut self, value: SqlValue) -> &mut Self {
        self.sql.push('?');
        self.binds.push(value);
        self
    }

    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn binds(&self) -> &[SqlValue] {
        &self.binds
    }

    pub(crate) fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.binds
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| value.bind(query))
    }

    pub(crate) async fn execute(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<SqliteQueryResult, sqlx::Error> {
        self.query().execute(conn).await
    }

    /// Runs a single-value query such as `SELECT COUNT(*) ...`.
    pub(crate) async fn fetch_i64(&self, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        let row = self.query().fetch_one(conn).await?;
        row.try_get::<i64, _>(0)
    }
}
