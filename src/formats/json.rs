use crate::error::{WebstoreError, WebstoreResult};
use serde_json::Value;
use webstore_schema::Row;

/// Streams `{"columns":[...],"rows":[...]}` with object keys in column order.
pub struct JsonTable {
    columns: Vec<String>,
    buf: Vec<u8>,
    rows: usize,
}

impl JsonTable {
    pub fn new(columns: &[String]) -> WebstoreResult<Self> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(br#"{"columns":"#);
        serde_json::to_writer(&mut buf, columns)?;
        buf.extend_from_slice(br#","rows":["#);
        Ok(Self {
            columns: columns.to_vec(),
            buf,
            rows: 0,
        })
    }

    pub fn push(&mut self, row: &Row) -> WebstoreResult<()> {
        if self.rows > 0 {
            self.buf.push(b',');
        }
        self.buf.push(b'{');
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                self.buf.push(b',');
            }
            serde_json::to_writer(&mut self.buf, column)?;
            self.buf.push(b':');
            serde_json::to_writer(&mut self.buf, row.get(column).unwrap_or(&Value::Null))?;
        }
        self.buf.push(b'}');
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(b"]}");
        self.buf
    }
}

/// Accepts an array of objects, a single object, or `{"rows": [...]}`.
pub fn decode_rows(body: &[u8]) -> WebstoreResult<Vec<Row>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| WebstoreError::MalformedBody(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("rows") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                obj.insert("rows".to_string(), other);
                vec![Value::Object(obj)]
            }
            None => vec![Value::Object(obj)],
        },
        other => {
            return Err(WebstoreError::MalformedBody(format!(
                "expected an object or an array of objects, got {}",
                type_name(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(obj.into_iter().collect()),
            other => Err(WebstoreError::MalformedBody(format!(
                "row {} is {}, expected an object",
                i + 1,
                type_name(&other)
            ))),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_accepts_all_three_shapes() {
        let rows = decode_rows(br#"[{"id":1},{"id":2}]"#).unwrap();
        assert_eq!(rows.len(), 2);

        let rows = decode_rows(br#"{"id":1,"name":"a"}"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("a")));

        let rows = decode_rows(br#"{"rows":[{"id":1},{}]}"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_empty());
    }

    #[test]
    fn decode_keeps_scalar_rows_column() {
        let rows = decode_rows(br#"{"rows":3,"id":1}"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("rows"), Some(&json!(3)));
    }

    #[test]
    fn decode_rejects_non_objects() {
        let err = decode_rows(br#"[{"id":1}, 5]"#).unwrap_err();
        assert!(matches!(err, WebstoreError::MalformedBody(ref m) if m.contains("row 2")));

        let err = decode_rows(b"not json").unwrap_err();
        assert!(matches!(err, WebstoreError::MalformedBody(_)));

        let err = decode_rows(b"\"text\"").unwrap_err();
        assert!(matches!(err, WebstoreError::MalformedBody(_)));
    }

    #[test]
    fn empty_table_renders_header_only() {
        let table = JsonTable::new(&["a".to_string()]).unwrap();
        assert_eq!(table.finish(), br#"{"columns":["a"],"rows":[]}"#.to_vec());
    }

    #[test]
    fn missing_cells_render_as_null() {
        let mut table = JsonTable::new(&["a".to_string(), "b".to_string()]).unwrap();
        table.push(&[("a".to_string(), json!(1))].into_iter().collect()).unwrap();
        assert_eq!(
            table.finish(),
            br#"{"columns":["a","b"],"rows":[{"a":1,"b":null}]}"#.to_vec()
        );
    }
}
