//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left alone in query values: unreserved per RFC 3986
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters left alone in a request path. `%` is kept so an already
/// encoded path is not encoded twice.
const PATH: &AsciiSet = &QUERY_VALUE.remove(b'/').remove(b'%');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for("/notes/", "/concepts/use-state") // -> "/notes/concepts/use-state"
/// ```
pub fn url_for(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Path of a concept page
pub fn concept_path(root: &str, slug: &str) -> String {
    url_for(root, &format!("concepts/{}", encode_query_value(slug)))
}

/// Percent-encode a query parameter value
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Percent-encode a request path for use inside an attribute
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

/// Append query parameters to a path, skipping empty values
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, encode_query_value(value)))
        .collect();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query.join("&"))
    }
}
