/// Ordered, multi-valued query parameter mapping.
///
/// Pairs keep the order they appeared in the query string. Extraction never
/// mutates: [`QueryParams::split_off`] hands back the values for one key plus a
/// fresh mapping holding everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parses a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in order of appearance.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Distinct keys in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k.as_str());
            }
        }
        keys
    }

    /// Returns every value stored under `key` and the mapping without it.
    pub fn split_off(&self, key: &str) -> (Vec<String>, QueryParams) {
        let (taken, rest): (Vec<_>, Vec<_>) =
            self.pairs.iter().cloned().partition(|(k, _)| k == key);
        (
            taken.into_iter().map(|(_, v)| v).collect(),
            QueryParams { pairs: rest },
        )
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_and_keeps_order() {
        let params = QueryParams::parse(Some("b=2&a=x%20y&b=3&flag"));
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "x y"), ("b", "3"), ("flag", "")]);
        assert_eq!(params.keys(), vec!["b", "a", "flag"]);
    }

    #[test]
    fn parse_without_query_is_empty() {
        assert!(QueryParams::parse(None).is_empty());
        assert!(QueryParams::parse(Some("")).is_empty());
    }

    #[test]
    fn split_off_leaves_input_untouched() {
        let params: QueryParams = [("_sort", "asc:a"), ("x", "1"), ("_sort", "desc:b")]
            .into_iter()
            .collect();
        let (sorts, rest) = params.split_off("_sort");
        assert_eq!(sorts, vec!["asc:a", "desc:b"]);
        assert_eq!(rest.iter().collect::<Vec<_>>(), vec![("x", "1")]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn get_returns_first_value() {
        let params: QueryParams = [("unique", "a"), ("unique", "b")].into_iter().collect();
        assert_eq!(params.get("unique"), Some("a"));
        assert_eq!(params.get_all("unique").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(params.get("missing"), None);
    }
}
