use std::collections::BTreeMap;

/// Decodes a location's query string into key/value pairs.
///
/// Accepts the search part with or without its leading `?`, or a whole URL.
/// A URL without `?` has no query.
/// Runs of `?`/`&` are treated as one separator, a `#fragment` is ignored and
/// segments without `=` are skipped. Percent escapes are decoded lossily, a
/// literal `+` stays a `+`, and the last value wins for a repeated key. Never
/// fails.
pub fn extract_query(location: &str) -> BTreeMap<String, String> {
    let search = match location.find('?') {
        Some(start) => &location[start..],
        None if location.contains('=') && !location.contains('/') => location,
        None => "",
    };
    let search = search.split('#').next().unwrap_or("");

    let mut params = BTreeMap::new();
    for segment in search.split(['?', '&']) {
        if !segment.contains('=') {
            continue;
        }
        // Form decoding reads `+` as a space; only percent escapes are decoded here.
        let segment = segment.replace('+', "%2B");
        for (key, value) in url::form_urlencoded::parse(segment.as_bytes()) {
            if !key.is_empty() {
                params.insert(key.into_owned(), value.into_owned());
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::extract_query;

    fn pairs(location: &str) -> Vec<(String, String)> {
        extract_query(location).into_iter().collect()
    }

    fn owned(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decodes_simple_search() {
        assert_eq!(pairs("?foo=bar"), owned(&[("foo", "bar")]));
        assert_eq!(
            pairs("https://example.test/news?page=2&sort=date#top"),
            owned(&[("page", "2"), ("sort", "date")])
        );
    }

    #[test]
    fn tolerates_repeated_separators() {
        assert_eq!(
            pairs("??a=1&&b=2&?c=3"),
            owned(&[("a", "1"), ("b", "2"), ("c", "3")])
        );
    }

    #[test]
    fn decodes_percent_escapes_and_keeps_last_value() {
        assert_eq!(
            pairs("?q=caf%C3%A9%20au%20lait&q=tea&k%5B0%5D=v"),
            owned(&[("k[0]", "v"), ("q", "tea")])
        );
        assert_eq!(pairs("?eq=a=b"), owned(&[("eq", "a=b")]));
        assert_eq!(
            pairs("?q=c%2B%2B+rust&tag=a+b&sp=x%20y"),
            owned(&[("q", "c+++rust"), ("sp", "x y"), ("tag", "a+b")])
        );
    }

    #[test]
    fn malformed_input_is_best_effort() {
        assert_eq!(pairs("?flag&x=%ZZ&=orphan&y="), owned(&[("x", "%ZZ"), ("y", "")]));
        assert!(pairs("").is_empty());
        assert!(pairs("/no/query").is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let location = "?b=2&a=1&b=3";
        assert_eq!(extract_query(location), extract_query(location));
    }
}
