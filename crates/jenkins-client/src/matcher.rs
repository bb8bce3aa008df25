//! Value-equality matching of outbound requests.
//!
//! A [`RequestMatcher`] compares method and URL (scheme, host, port, path)
//! by default. Headers, query and body are opt-in refinements so a test only
//! pins down what it cares about.

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::core::basic_auth_value;
use crate::http::Request;

/// Expected request plus the strictness to compare with.
#[derive(Debug, Clone)]
pub struct RequestMatcher {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
    match_headers: bool,
    match_query: bool,
    match_body: bool,
    verbose: bool,
}

impl RequestMatcher {
    /// Match on method and URL only.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            match_headers: false,
            match_query: false,
            match_body: false,
            verbose: false,
        }
    }

    /// Match on everything: method, URL, headers, query and body.
    pub fn strict(method: Method, url: Url) -> Self {
        Self::new(method, url)
            .with_headers()
            .with_query()
            .with_body()
    }

    /// Add an expected header value.
    ///
    /// Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Expect basic auth credentials.
    pub fn basic_auth(mut self, user: &str, token: &str) -> Self {
        if let Ok(value) = basic_auth_value(user, token) {
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    /// Set the expected body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Also require equal header mappings.
    pub fn with_headers(mut self) -> Self {
        self.match_headers = true;
        self
    }

    /// Also require equal decoded query mappings.
    pub fn with_query(mut self) -> Self {
        self.match_query = true;
        self
    }

    /// Also require byte-equal bodies.
    pub fn with_body(mut self) -> Self {
        self.match_body = true;
        self
    }

    /// Log the reason of every mismatch.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Compare against `actual`.
    ///
    /// When body matching is on, a streaming body is drained and replaced
    /// with its buffered bytes, so `actual` can still be sent afterwards.
    pub async fn matches(&self, actual: &mut Request) -> bool {
        if self.match_body {
            if let Err(e) = actual.body.buffer().await {
                self.log_mismatch(format_args!("failed to read body: {e}"));
                return false;
            }
        }
        self.matches_buffered(actual)
    }

    /// Compare against `actual` without reading its body.
    ///
    /// A body that is still an unread stream never matches when body
    /// matching is on; call [`RequestMatcher::matches`] to buffer it first.
    pub fn matches_buffered(&self, actual: &Request) -> bool {
        if self.method != actual.method {
            self.log_mismatch(format_args!("method {} != {}", self.method, actual.method));
            return false;
        }
        if !same_location(&self.url, &actual.url) {
            self.log_mismatch(format_args!("url {} != {}", self.url, actual.url));
            return false;
        }
        if self.match_headers && !headers_match(&self.headers, &actual.headers) {
            self.log_mismatch(format_args!(
                "headers {:?} != {:?}",
                self.headers, actual.headers
            ));
            return false;
        }
        if self.match_query && !queries_match(&self.url, &actual.url) {
            self.log_mismatch(format_args!(
                "query {:?} != {:?}",
                self.url.query(),
                actual.url.query()
            ));
            return false;
        }
        if self.match_body {
            match actual.body.as_bytes() {
                Some(body) if body == self.body.as_ref() => {}
                Some(body) => {
                    self.log_mismatch(format_args!(
                        "body {:?} != {:?}",
                        String::from_utf8_lossy(&self.body),
                        String::from_utf8_lossy(body)
                    ));
                    return false;
                }
                None => {
                    self.log_mismatch(format_args!("body is an unread stream"));
                    return false;
                }
            }
        }
        true
    }

    fn log_mismatch(&self, reason: std::fmt::Arguments<'_>) {
        if self.verbose {
            tracing::debug!(method = %self.method, url = %self.url, "request mismatch: {reason}");
        }
    }
}

/// Scheme, host, port and path equal; query and fragment ignored.
fn same_location(expected: &Url, actual: &Url) -> bool {
    expected.scheme() == actual.scheme()
        && expected.host_str() == actual.host_str()
        && expected.port_or_known_default() == actual.port_or_known_default()
        && expected.path() == actual.path()
}

/// Full mapping equality: same key count, and every key carries the same
/// values in both maps, regardless of value order.
pub fn headers_match(left: &HeaderMap, right: &HeaderMap) -> bool {
    if left.keys_len() != right.keys_len() {
        return false;
    }
    left.keys().all(|key| {
        let mut left_values: Vec<&[u8]> = left.get_all(key).iter().map(|v| v.as_bytes()).collect();
        let mut right_values: Vec<&[u8]> =
            right.get_all(key).iter().map(|v| v.as_bytes()).collect();
        left_values.sort_unstable();
        right_values.sort_unstable();
        left_values == right_values
    })
}

/// Decoded query equality, independent of key and value order.
pub fn queries_match(left: &Url, right: &Url) -> bool {
    query_map(left) == query_map(right)
}

fn query_map(url: &Url) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        map.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for values in map.values_mut() {
        values.sort_unstable();
    }
    map
}
