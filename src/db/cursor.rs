//! Lazy, single-pass adapter from sqlx result rows to [`Row`] records.

use super::schema::ColumnKind;
use crate::error::{WebstoreError, WebstoreResult};
use base64::Engine as _;
use futures::{Stream, StreamExt, stream::BoxStream};
use serde_json::{Number, Value};
use sqlx::{Row as _, TypeInfo, ValueRef, sqlite::SqliteRow};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use webstore_schema::Row;

/// Forward-only result set.
///
/// Each poll materialises one complete row keyed by column name. The cursor is
/// consumed by iteration and cannot be rewound; buffer the rows if a second
/// pass is needed.
pub struct RowCursor<'a> {
    columns: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: BoxStream<'a, Result<SqliteRow, sqlx::Error>>,
}

impl<'a> RowCursor<'a> {
    pub(crate) fn new(
        columns: Vec<String>,
        kinds: Vec<ColumnKind>,
        rows: BoxStream<'a, Result<SqliteRow, sqlx::Error>>,
    ) -> Self {
        Self {
            columns,
            kinds,
            rows,
        }
    }

    /// Result columns in select order, known before the first row arrives.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn materialize(&self, row: &SqliteRow) -> WebstoreResult<Row> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = self.kinds.get(i).copied().unwrap_or(ColumnKind::Plain);
                Ok((name.clone(), decode_cell(row, i, kind)?))
            })
            .collect()
    }
}

impl Stream for RowCursor<'_> {
    type Item = WebstoreResult<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.rows.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(this.materialize(&row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(WebstoreError::rejected(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn decode_cell(row: &SqliteRow, index: usize, kind: ColumnKind) -> WebstoreResult<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match (storage.as_str(), kind) {
        ("INTEGER", ColumnKind::Boolean) => Value::Bool(row.try_get_unchecked::<i64, _>(index)? != 0),
        ("INTEGER", _) => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        ("REAL", _) => Number::from_f64(row.try_get_unchecked::<f64, _>(index)?)
            .map_or(Value::Null, Value::Number),
        ("BLOB", _) => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        (_, ColumnKind::Json) => {
            let text = row.try_get_unchecked::<String, _>(index)?;
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}
