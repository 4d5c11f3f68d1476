use super::schema::{ColumnKind, quote_ident};
use super::value::{SqlBuf, SqlValue};
use crate::error::{WebstoreError, WebstoreResult};
use crate::query::QueryParams;

/// Equality filter over known columns.
///
/// Values given for the same column are alternatives (`IN`), distinct columns
/// must all match. Values are bound as text; SQLite applies the column's
/// affinity before comparing, so `id=1` matches an INTEGER column. Boolean
/// columns also accept the `true`/`false` spelling reads render them with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<(String, Vec<SqlValue>)>,
}

impl Predicate {
    /// Matches every row.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn is_always(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `kind_of` returns `None` for columns the table does not have.
    pub(crate) fn from_params(
        params: &QueryParams,
        kind_of: impl Fn(&str) -> Option<ColumnKind>,
    ) -> WebstoreResult<Self> {
        let clauses = params
            .keys()
            .into_iter()
            .map(|key| {
                let Some(kind) = kind_of(key) else {
                    return Err(WebstoreError::UnknownColumn(key.to_string()));
                };
                let values = params
                    .get_all(key)
                    .map(|value| filter_value(kind, value))
                    .collect();
                Ok((key.to_string(), values))
            })
            .collect::<WebstoreResult<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    pub(crate) fn write_where(&self, sql: &mut SqlBuf) {
        for (i, (column, values)) in self.clauses.iter().enumerate() {
            sql.push(if i == 0 { " WHERE " } else { " AND " });
            sql.push(&quote_ident(column));
            if let [value] = values.as_slice() {
                sql.push(" = ").push_bind(value.clone());
            } else {
                sql.push(" IN (");
                for (j, value) in values.iter().enumerate() {
                    if j > 0 {
                        sql.push(", ");
                    }
                    sql.push_bind(value.clone());
                }
                sql.push(")");
            }
        }
    }
}

fn filter_value(kind: ColumnKind, raw: &str) -> SqlValue {
    match kind {
        ColumnKind::Boolean if raw.eq_ignore_ascii_case("true") => SqlValue::Integer(1),
        ColumnKind::Boolean if raw.eq_ignore_ascii_case("false") => SqlValue::Integer(0),
        _ => SqlValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(column: &str) -> Option<ColumnKind> {
        match column {
            "id" | "name" => Some(ColumnKind::Plain),
            "flag" => Some(ColumnKind::Boolean),
            _ => None,
        }
    }

    #[test]
    fn builds_equality_and_in_clauses() {
        let params = QueryParams::parse(Some("name=a&id=1&name=b"));
        let predicate = Predicate::from_params(&params, known).unwrap();

        let mut sql = SqlBuf::new("SELECT * FROM t");
        predicate.write_where(&mut sql);
        assert_eq!(
            sql.sql(),
            "SELECT * FROM t WHERE \"name\" IN (?, ?) AND \"id\" = ?"
        );
        assert_eq!(sql.binds().len(), 3);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let params = QueryParams::parse(Some("id=1&age=3"));
        let err = Predicate::from_params(&params, known).unwrap_err();
        assert!(matches!(err, WebstoreError::UnknownColumn(ref c) if c == "age"));
    }

    #[test]
    fn empty_params_match_everything() {
        let predicate = Predicate::from_params(&QueryParams::default(), known).unwrap();
        assert!(predicate.is_always());

        let mut sql = SqlBuf::new("SELECT * FROM t");
        predicate.write_where(&mut sql);
        assert_eq!(sql.sql(), "SELECT * FROM t");
    }

    #[test]
    fn boolean_columns_accept_rendered_spelling() {
        let params = QueryParams::parse(Some("flag=true&flag=FALSE&flag=1&name=true"));
        let predicate = Predicate::from_params(&params, known).unwrap();

        let mut sql = SqlBuf::new("SELECT * FROM t");
        predicate.write_where(&mut sql);
        assert_eq!(
            sql.binds(),
            &[
                SqlValue::Integer(1),
                SqlValue::Integer(0),
                SqlValue::Text("1".into()),
                SqlValue::Text("true".into()),
            ]
        );
    }
}
