use serde_json::Value;
use std::collections::BTreeMap;

/// One table record: column name to scalar value.
///
/// Keys are kept ordered so two rows with the same content compare equal
/// regardless of how they were assembled. Column order for rendering comes from
/// the table payload, not from the row.
pub type Row = BTreeMap<String, Value>;

/// Builds a [`Row`] from `(column, value)` pairs. Later duplicates win.
pub fn row_from_pairs<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_from_pairs_keeps_last_duplicate() {
        let row = row_from_pairs([("id", json!(1)), ("name", json!("a")), ("id", json!(2))]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&json!(2)));
    }

    #[test]
    fn rows_compare_independent_of_insertion_order() {
        let a = row_from_pairs([("a", json!(1)), ("b", json!("x"))]);
        let b = row_from_pairs([("b", json!("x")), ("a", json!(1))]);
        assert_eq!(a, b);
    }
}
