//! Minimal RFC 4180 reader and writer.
//!
//! Records end in CRLF on output; input accepts LF, CRLF or CR. Quoted fields
//! may span lines.

use crate::error::{WebstoreError, WebstoreResult};
use serde_json::Value;
use webstore_schema::{Message, Row};

pub struct CsvTable {
    columns: Vec<String>,
    buf: String,
}

impl CsvTable {
    pub fn new(columns: &[String]) -> Self {
        let mut buf = String::with_capacity(256);
        write_record(&mut buf, columns.iter().map(String::as_str));
        Self {
            columns: columns.to_vec(),
            buf,
        }
    }

    pub fn push(&mut self, row: &Row) {
        let cells: Vec<String> = self
            .columns
            .iter()
            .map(|c| row.get(c).map(cell_text).unwrap_or_default())
            .collect();
        write_record(&mut self.buf, cells.iter().map(String::as_str));
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

pub fn render_message(message: &Message) -> Vec<u8> {
    let mut buf = String::new();
    write_record(&mut buf, ["state", "message", "code", "url"]);
    let code = message.code.to_string();
    write_record(
        &mut buf,
        [
            message.state.as_str(),
            message.message.as_str(),
            code.as_str(),
            message.url.as_deref().unwrap_or(""),
        ],
    );
    buf.into_bytes()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_record<'a>(buf: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            buf.push('"');
            buf.push_str(&field.replace('"', "\"\""));
            buf.push('"');
        } else {
            buf.push_str(field);
        }
    }
    buf.push_str("\r\n");
}

/// Lazily decodes records after the header into rows.
///
/// Empty cells are left out of the row, so a blank line yields an empty row.
pub struct CsvRows<'a> {
    input: &'a str,
    pos: usize,
    record: usize,
    header: Vec<String>,
    failed: bool,
}

impl<'a> CsvRows<'a> {
    pub fn new(body: &'a [u8]) -> WebstoreResult<Self> {
        let input = std::str::from_utf8(body)
            .map_err(|e| WebstoreError::MalformedBody(format!("CSV is not UTF-8: {e}")))?;
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut rows = Self {
            input,
            pos: 0,
            record: 0,
            header: Vec::new(),
            failed: false,
        };

        while let Some(fields) = rows.next_record()? {
            if is_blank(&fields) {
                continue;
            }
            if let Some(i) = fields.iter().position(String::is_empty) {
                return Err(WebstoreError::MalformedBody(format!(
                    "CSV header column {} is empty",
                    i + 1
                )));
            }
            rows.header = fields;
            break;
        }
        Ok(rows)
    }

    fn next_record(&mut self) -> WebstoreResult<Option<Vec<String>>> {
        let bytes = self.input.as_bytes();
        let mut i = self.pos;
        if i >= bytes.len() {
            return Ok(None);
        }
        self.record += 1;

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut quoted = false;

        loop {
            let Some(&b) = bytes.get(i) else {
                if in_quotes {
                    return Err(WebstoreError::MalformedBody(format!(
                        "unterminated quoted field in CSV record {}",
                        self.record
                    )));
                }
                fields.push(field);
                break;
            };

            if in_quotes {
                if b == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        field.push('"');
                        i += 2;
                    } else {
                        in_quotes = false;
                        i += 1;
                    }
                } else {
                    let end = find_from(bytes, i + 1, |c| c == b'"');
                    field.push_str(&self.input[i..end]);
                    i = end;
                }
                continue;
            }

            match b {
                b'"' if field.is_empty() && !quoted => {
                    in_quotes = true;
                    quoted = true;
                    i += 1;
                }
                b',' => {
                    fields.push(std::mem::take(&mut field));
                    quoted = false;
                    i += 1;
                }
                b'\r' | b'\n' => {
                    i += 1;
                    if b == b'\r' && bytes.get(i) == Some(&b'\n') {
                        i += 1;
                    }
                    fields.push(field);
                    break;
                }
                _ => {
                    let end = find_from(bytes, i + 1, |c| matches!(c, b',' | b'"' | b'\r' | b'\n'));
                    field.push_str(&self.input[i..end]);
                    i = end;
                }
            }
        }

        self.pos = i;
        Ok(Some(fields))
    }

    fn to_row(&self, fields: Vec<String>) -> WebstoreResult<Row> {
        if fields.len() > self.header.len() && !is_blank(&fields[self.header.len()..]) {
            return Err(WebstoreError::MalformedBody(format!(
                "CSV record {} has {} fields, header has {}",
                self.record,
                fields.len(),
                self.header.len()
            )));
        }
        Ok(self
            .header
            .iter()
            .zip(fields)
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), Value::String(v)))
            .collect())
    }
}

impl Iterator for CsvRows<'_> {
    type Item = WebstoreResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.header.is_empty() {
            return None;
        }
        let result = match self.next_record() {
            Ok(Some(fields)) => self.to_row(fields),
            Ok(None) => return None,
            Err(e) => Err(e),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(String::is_empty)
}

fn find_from(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes
        .get(start..)
        .and_then(|rest| rest.iter().position(|&c| pred(c)))
        .map_or(bytes.len(), |p| start + p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(body: &str) -> Vec<Row> {
        CsvRows::new(body.as_bytes())
            .unwrap()
            .collect::<WebstoreResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn decode_reads_header_and_rows() {
        let rows = decode("id,name\n1,a\n2,b\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&json!("1")));
        assert_eq!(rows[1].get("name"), Some(&json!("b")));
    }

    #[test]
    fn blank_lines_become_empty_rows() {
        let rows = decode("id,name\r\n1,a\r\n\r\n2,b");
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
    }

    #[test]
    fn empty_cells_are_omitted() {
        let rows = decode("id,name,city\n1,,x\n");
        assert_eq!(rows[0].len(), 2);
        assert!(!rows[0].contains_key("name"));
    }

    #[test]
    fn quoted_fields_handle_separators_quotes_and_newlines() {
        let rows = decode("a,b\n\"x,y\",\"say \"\"hi\"\"\nthere\"\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&json!("x,y")));
        assert_eq!(rows[0].get("b"), Some(&json!("say \"hi\"\nthere")));
    }

    #[test]
    fn stray_quote_inside_unquoted_field_is_literal() {
        let rows = decode("a\nab\"c\n");
        assert_eq!(rows[0].get("a"), Some(&json!("ab\"c")));
    }

    #[test]
    fn unicode_survives() {
        let rows = decode("名前,city\nÉmile,Zürich\n");
        assert_eq!(rows[0].get("名前"), Some(&json!("Émile")));
        assert_eq!(rows[0].get("city"), Some(&json!("Zürich")));
    }

    #[test]
    fn too_many_fields_is_malformed() {
        let mut rows = CsvRows::new(b"a,b\n1,2,3\n4,5\n").unwrap();
        assert!(matches!(
            rows.next(),
            Some(Err(WebstoreError::MalformedBody(_)))
        ));
        assert!(rows.next().is_none());
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let mut rows = CsvRows::new(b"a\n\"open\n").unwrap();
        assert!(matches!(
            rows.next(),
            Some(Err(WebstoreError::MalformedBody(_)))
        ));
    }

    #[test]
    fn empty_body_has_no_rows() {
        assert!(decode("").is_empty());
        assert!(decode("\n\n").is_empty());
    }

    #[test]
    fn message_renders_as_single_record() {
        let msg = Message::success("Table dropped: t", 410);
        let text = String::from_utf8(render_message(&msg)).unwrap();
        assert_eq!(text, "state,message,code,url\r\nsuccess,Table dropped: t,410,\r\n");
    }

    #[test]
    fn table_cells_render_scalars() {
        let mut table = CsvTable::new(&["a".to_string(), "b".to_string(), "c".to_string()]);
        table.push(
            &[
                ("a".to_string(), json!(true)),
                ("b".to_string(), json!(1.5)),
                ("c".to_string(), Value::Null),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(
            String::from_utf8(table.finish()).unwrap(),
            "a,b,c\r\ntrue,1.5,\r\n"
        );
    }
}
