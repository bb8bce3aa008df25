//! Plain-data HTTP types exchanged between the core and a [`Transport`].
//!
//! Requests carry a [`Body`] that may be a read-once stream; responses are
//! always fully buffered so callers can read headers and body freely.
//!
//! [`Transport`]: crate::transport::Transport

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};
use crate::multipart::Form;

/// Content type used by the server's classic form posts.
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// Content type for JSON payloads.
pub const APPLICATION_JSON: &str = "application/json";

// ─────────────────────────────────────────────────────────────────────────────
// Body
// ─────────────────────────────────────────────────────────────────────────────

/// Request body.
///
/// A `Stream` body can only be read once. [`Body::buffer`] drains it and
/// replaces it with the buffered bytes so it can be inspected and still sent.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// In-memory body.
    Bytes(Bytes),
    /// Read-once stream of chunks.
    Stream(ByteStream),
}

/// Read-once body stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

impl Body {
    /// Wrap a read-once stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    {
        Body::Stream(Box::pin(stream))
    }

    /// Drain the body into memory, leaving a replayable copy in place.
    pub async fn buffer(&mut self) -> io::Result<Bytes> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bytes) => Ok(bytes.clone()),
            Body::Stream(stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.try_next().await? {
                    buf.extend_from_slice(&chunk);
                }
                let bytes = buf.freeze();
                *self = Body::Bytes(bytes.clone());
                Ok(bytes)
            }
        }
    }

    /// The body bytes if they are already in memory.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[]),
            Body::Bytes(bytes) => Some(bytes.as_ref()),
            Body::Stream(_) => None,
        }
    }

    /// Whether this body is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_some_and(<[u8]>::is_empty)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes.into())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Bytes(text.into())
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// A fully resolved outbound request.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Request {
    /// Create a request without headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }
}

/// A buffered response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Add a header, ignoring names or values that cannot be encoded.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expected status
// ─────────────────────────────────────────────────────────────────────────────

/// Status codes a caller accepts as success.
///
/// The server is inconsistent across endpoints (200 for reads, 201 for
/// creates, 302 for form posts), so every call states its own expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedStatus(Vec<u16>);

impl ExpectedStatus {
    /// Accept any of the given codes.
    pub fn any_of(codes: impl IntoIterator<Item = u16>) -> Self {
        Self(codes.into_iter().collect())
    }

    /// Also accept `code`.
    pub fn or(mut self, code: u16) -> Self {
        if !self.0.contains(&code) {
            self.0.push(code);
        }
        self
    }

    /// Whether `status` is acceptable.
    pub fn accepts(&self, status: u16) -> bool {
        self.0.contains(&status)
    }

    /// Accepted codes in declaration order.
    pub fn codes(&self) -> &[u16] {
        &self.0
    }
}

impl Default for ExpectedStatus {
    fn default() -> Self {
        Self(vec![200])
    }
}

impl From<u16> for ExpectedStatus {
    fn from(code: u16) -> Self {
        Self(vec![code])
    }
}

impl<const N: usize> From<[u16; N]> for ExpectedStatus {
    fn from(codes: [u16; N]) -> Self {
        Self::any_of(codes)
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(u16::to_string).collect();
        f.write_str(&codes.join(" or "))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder
// ─────────────────────────────────────────────────────────────────────────────

/// Response body decoder for typed requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decoder {
    #[default]
    Json,
    Xml,
}

impl Decoder {
    /// Decode `body` into `T`.
    pub fn decode<T: serde::de::DeserializeOwned>(self, body: &[u8]) -> Result<T> {
        match self {
            Decoder::Json => {
                serde_json::from_slice(body).map_err(|e| Error::decode("json", e, body))
            }
            Decoder::Xml => {
                let text =
                    std::str::from_utf8(body).map_err(|e| Error::decode("xml", e, body))?;
                quick_xml::de::from_str(text).map_err(|e| Error::decode("xml", e, body))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request spec
// ─────────────────────────────────────────────────────────────────────────────

/// Description of one call: method, relative path, headers, body and the
/// status codes that count as success.
#[derive(Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    pub expected: ExpectedStatus,
}

impl RequestSpec {
    /// Create a spec for `method` on `path`, expecting 200.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Body::Empty,
            expected: ExpectedStatus::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an `application/x-www-form-urlencoded` body.
    pub fn form<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.header(CONTENT_TYPE.as_str(), APPLICATION_FORM)
            .body(encoded)
    }

    /// Only set the form content type, without a body.
    pub fn form_content_type(self) -> Self {
        self.header(CONTENT_TYPE.as_str(), APPLICATION_FORM)
    }

    /// Set a JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header(CONTENT_TYPE.as_str(), APPLICATION_JSON)
            .body(body))
    }

    /// Set a `multipart/form-data` body.
    pub fn multipart(self, form: Form) -> Self {
        let content_type = form.content_type();
        self.header(CONTENT_TYPE.as_str(), content_type)
            .body(form.into_bytes())
    }

    /// Set the accepted status codes.
    pub fn expect(mut self, expected: impl Into<ExpectedStatus>) -> Self {
        self.expected = expected.into();
        self
    }

    /// Whether this request changes server state and so needs a crumb.
    pub fn is_mutating(&self) -> bool {
        is_mutating(&self.method)
    }
}

/// Anything other than GET and HEAD needs a crumb.
pub fn is_mutating(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}
