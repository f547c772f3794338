// File: src/url.rs
// Purpose: Request URL parsing and query-string helpers

use axum::http::Uri;
use std::collections::BTreeMap;

/// Route and query parameters, ordered by key so generated URLs are stable
pub type Params = BTreeMap<String, String>;

/// A request URL split into pathname and decoded query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Original URL as received
    pub raw: String,
    /// Path component, always starting with `/`
    pub pathname: String,
    /// Decoded query-string parameters
    pub query: Params,
}

impl ParsedUrl {
    /// Parses an origin-form (`/path?query`) or absolute URL
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routes::url::ParsedUrl;
    ///
    /// let url = ParsedUrl::parse("/search?q=rust+router&page=2");
    /// assert_eq!(url.pathname, "/search");
    /// assert_eq!(url.query.get("q"), Some(&"rust router".to_string()));
    /// assert_eq!(url.query.get("page"), Some(&"2".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let (pathname, query) = match raw.parse::<Uri>() {
            Ok(uri) => (uri.path().to_string(), uri.query().map(str::to_string)),
            Err(_) => split_manually(raw),
        };

        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else {
            pathname
        };

        Self {
            raw: raw.to_string(),
            pathname,
            query: query.as_deref().map(parse_query).unwrap_or_default(),
        }
    }

    /// Parses the path and query of an incoming request URI
    pub fn from_uri(uri: &Uri) -> Self {
        let raw = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Self {
            pathname: uri.path().to_string(),
            query: uri.query().map(parse_query).unwrap_or_default(),
            raw,
        }
    }
}

fn split_manually(raw: &str) -> (String, Option<String>) {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

/// Decodes an `application/x-www-form-urlencoded` query string
///
/// Later occurrences of a key replace earlier ones.
pub fn parse_query(query: &str) -> Params {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

/// Encodes parameters as a query string (without the leading `?`)
pub fn to_query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    params
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends a query string to `path` when there is one
pub(crate) fn with_query(path: String, query: String) -> String {
    if query.is_empty() {
        path
    } else {
        format!("{}?{}", path, query)
    }
}
