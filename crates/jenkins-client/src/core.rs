//! Shared request core: URL resolution, basic auth, crumb issuance and
//! status/body handling for every resource client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{Decoder, Request, RequestSpec, Response, is_mutating};
use crate::transport::{ReqwestTransport, Transport};

/// Endpoint issuing CSRF crumbs.
pub const CRUMB_ISSUER_PATH: &str = "/crumbIssuer/api/json";

/// Default timeout for the built-in transport.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A CSRF token pair. The header named `crumb_request_field` must carry
/// `crumb` on every mutating request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    pub crumb_request_field: String,
    pub crumb: String,
}

/// What to do when fetching a crumb fails.
///
/// A 404 from the issuer means CSRF protection is disabled on the server
/// and never counts as a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrumbPolicy {
    /// Log the failure and send the request without a crumb.
    #[default]
    Permissive,
    /// Abort the call with [`Error::Crumb`].
    Strict,
    /// Never fetch a crumb.
    Skip,
}

impl std::str::FromStr for CrumbPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            "skip" => Ok(Self::Skip),
            other => Err(Error::Config(format!("unknown crumb policy '{other}'"))),
        }
    }
}

impl fmt::Display for CrumbPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
            Self::Skip => "skip",
        })
    }
}

/// Connection to one automation server.
///
/// Holds the base URL, optional credentials and the round-trip transport.
/// Immutable once built and cheap to clone, so it can be shared by any
/// number of resource clients and concurrent calls.
#[derive(Clone)]
pub struct JenkinsCore {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    base_url: Url,
    user_name: Option<String>,
    token: Option<String>,
    transport: Arc<dyn Transport>,
    crumb_policy: CrumbPolicy,
}

impl fmt::Debug for JenkinsCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsCore")
            .field("base_url", &self.inner.base_url.as_str())
            .field("user_name", &self.inner.user_name)
            .field("crumb_policy", &self.inner.crumb_policy)
            .finish_non_exhaustive()
    }
}

impl JenkinsCore {
    /// Create a new builder.
    pub fn builder() -> CoreBuilder {
        CoreBuilder::new()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn user_name(&self) -> Option<&str> {
        self.inner.user_name.as_deref()
    }

    pub fn crumb_policy(&self) -> CrumbPolicy {
        self.inner.crumb_policy
    }

    /// The round-trip transport, for call sites that assemble requests by
    /// hand (see [`JenkinsCore::auth_handle`]).
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Resolve `path` against the base URL.
    ///
    /// Relative paths are appended to the base URL (keeping any context path
    /// such as `/jenkins`); absolute `http(s)` URLs pass through unchanged.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build a request for `spec` with basic auth attached (no crumb).
    pub fn new_request(&self, spec: RequestSpec) -> Result<Request> {
        let RequestSpec {
            method,
            path,
            headers,
            body,
            ..
        } = spec;
        let mut request = Request::new(method, self.resolve_url(&path)?);
        for (name, value) in headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| Error::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            request.headers.append(header_name, header_value);
        }
        request.body = body;
        self.apply_basic_auth(&mut request)?;
        Ok(request)
    }

    /// Attach basic auth when both user name and token are configured.
    fn apply_basic_auth(&self, request: &mut Request) -> Result<()> {
        if let (Some(user), Some(token)) = (&self.inner.user_name, &self.inner.token) {
            if !user.is_empty() && !token.is_empty() {
                request
                    .headers
                    .insert(AUTHORIZATION, basic_auth_value(user, token)?);
            }
        }
        Ok(())
    }

    /// Attach basic auth and, for mutating methods, a crumb header.
    pub async fn auth_handle(&self, request: &mut Request) -> Result<()> {
        self.apply_basic_auth(request)?;
        if !is_mutating(&request.method) {
            return Ok(());
        }
        if let Some((name, value)) = self.issue_crumb().await? {
            request.headers.append(name, value);
        }
        Ok(())
    }

    /// Fetch a crumb.
    ///
    /// Returns `Ok(None)` when the server has no crumb issuer (404).
    pub async fn get_crumb(&self) -> Result<Option<Crumb>> {
        let response = self.request(RequestSpec::get(CRUMB_ISSUER_PATH)).await?;
        match response.status {
            200 => Decoder::Json.decode(&response.body).map(Some),
            404 => Ok(None),
            status => Err(Error::Crumb(format!("unexpected status code: {status}"))),
        }
    }

    /// Fetch a crumb and apply the configured [`CrumbPolicy`].
    ///
    /// A crumb whose field name or value cannot form a header counts as a
    /// failed fetch.
    async fn issue_crumb(&self) -> Result<Option<(HeaderName, HeaderValue)>> {
        let policy = self.inner.crumb_policy;
        if policy == CrumbPolicy::Skip {
            return Ok(None);
        }
        let fetched = match self.get_crumb().await {
            Ok(Some(crumb)) => crumb_header(&crumb).map(Some),
            Ok(None) => {
                tracing::trace!("crumb issuer not available, sending without crumb");
                Ok(None)
            }
            Err(e) => Err(e),
        };
        match fetched {
            Ok(header) => Ok(header),
            Err(e) if policy == CrumbPolicy::Strict => Err(match e {
                Error::Crumb(_) => e,
                other => Error::Crumb(other.to_string()),
            }),
            Err(e) => {
                tracing::warn!(crumb = "skipped", error = %e, "crumb issuance failed, sending without crumb");
                Ok(None)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request primitives
    // ─────────────────────────────────────────────────────────────────────────

    /// Send `spec` with basic auth only. Never attaches a crumb and never
    /// checks the status.
    pub async fn request(&self, spec: RequestSpec) -> Result<Response> {
        let request = self.new_request(spec)?;
        self.send(request).await
    }

    /// Send `spec`, fetching and attaching a crumb first when the method is
    /// mutating. The status is not checked.
    pub async fn request_with_auth(&self, spec: RequestSpec) -> Result<Response> {
        let mutating = spec.is_mutating();
        let mut request = self.new_request(spec)?;
        if mutating {
            if let Some((name, value)) = self.issue_crumb().await? {
                request.headers.append(name, value);
            }
        }
        self.send(request).await
    }

    /// Alias of [`JenkinsCore::request_with_auth`] for call sites that read
    /// headers or body off the raw response.
    pub async fn request_with_response(&self, spec: RequestSpec) -> Result<Response> {
        self.request_with_auth(spec).await
    }

    /// Send `spec` and check the status against its expectation, returning
    /// the whole response.
    ///
    /// On mismatch the error carries the actual status (see
    /// [`Error::status`]) so callers can tolerate endpoint quirks.
    pub async fn request_checked(&self, spec: RequestSpec) -> Result<Response> {
        let expected = spec.expected.clone();
        let response = self.request_with_auth(spec).await?;
        if expected.accepts(response.status) {
            Ok(response)
        } else {
            Err(Error::StatusMismatch {
                expected,
                actual: response.status,
                body: response.text(),
            })
        }
    }

    /// Send `spec`, check the status and return it.
    pub async fn request_expecting_status(&self, spec: RequestSpec) -> Result<u16> {
        Ok(self.request_checked(spec).await?.status)
    }

    /// Send `spec` when only the status matters.
    pub async fn request_without_data(&self, spec: RequestSpec) -> Result<u16> {
        self.request_expecting_status(spec).await
    }

    /// Send `spec`, check the status and decode the body with `decoder`.
    pub async fn request_decoding<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
        decoder: Decoder,
    ) -> Result<T> {
        let response = self.request_checked(spec).await?;
        decoder.decode(&response.body)
    }

    /// Send `spec`, check the status and decode a JSON body.
    pub async fn request_with_data<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T> {
        self.request_decoding(spec, Decoder::Json).await
    }

    /// Send `spec`, check the status and return the body as text.
    pub async fn request_text(&self, spec: RequestSpec) -> Result<String> {
        Ok(self.request_checked(spec).await?.text())
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.inner.transport.round_trip(request).await?;
        tracing::debug!(%method, %url, status = response.status, "request completed");
        Ok(response)
    }
}

/// Header pair carrying `crumb`.
fn crumb_header(crumb: &Crumb) -> Result<(HeaderName, HeaderValue)> {
    let invalid = |reason: String| Error::InvalidHeader {
        name: crumb.crumb_request_field.clone(),
        reason,
    };
    let name = HeaderName::from_bytes(crumb.crumb_request_field.as_bytes())
        .map_err(|e| invalid(e.to_string()))?;
    let value = HeaderValue::from_str(&crumb.crumb).map_err(|e| invalid(e.to_string()))?;
    Ok((name, value))
}

/// `Basic base64(user:token)` header value, marked sensitive.
pub fn basic_auth_value(user: &str, token: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{user}:{token}"));
    let mut value =
        HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|e| Error::InvalidHeader {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for a [`JenkinsCore`].
pub struct CoreBuilder {
    base_url: Option<String>,
    user_name: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    crumb_policy: CrumbPolicy,
}

impl fmt::Debug for CoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreBuilder")
            .field("base_url", &self.base_url)
            .field("user_name", &self.user_name)
            .field("timeout", &self.timeout)
            .field("crumb_policy", &self.crumb_policy)
            .finish_non_exhaustive()
    }
}

impl CoreBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            user_name: None,
            token: None,
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: None,
            transport: None,
            crumb_policy: CrumbPolicy::default(),
        }
    }

    /// Set the server URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set basic auth credentials (user name and API token or password).
    pub fn basic_auth(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self.token = Some(token.into());
        self
    }

    /// Set only the user name. Some endpoints are addressed by user name
    /// even without credentials.
    pub fn user_name(mut self, user: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self
    }

    /// Set the request timeout of the built-in transport. `None` disables it.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent for the built-in transport.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a custom transport instead of the built-in `reqwest` one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the crumb policy.
    pub fn crumb_policy(mut self, policy: CrumbPolicy) -> Self {
        self.crumb_policy = policy;
        self
    }

    /// Build the core.
    pub fn build(self) -> Result<JenkinsCore> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        let base_url = Url::parse(&base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported URL scheme '{}'",
                base_url.scheme()
            )));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("jenkins-client/{}", env!("CARGO_PKG_VERSION")));
                Arc::new(ReqwestTransport::with_options(self.timeout, &user_agent)?)
            }
        };

        Ok(JenkinsCore {
            inner: Arc::new(CoreInner {
                base_url,
                user_name: self.user_name.filter(|u| !u.is_empty()),
                token: self.token.filter(|t| !t.is_empty()),
                transport,
                crumb_policy: self.crumb_policy,
            }),
        })
    }
}

impl Default for CoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::RequestMatcher;
    use crate::testing::{
        MOCK_CRUMB, MOCK_CRUMB_FIELD, MockTransport, endpoint, expect_crumb, expect_crumb_response,
    };
    use reqwest::Method;

    fn core_with(mock: &Arc<MockTransport>) -> JenkinsCore {
        JenkinsCore::builder()
            .base_url("http://localhost")
            .transport(mock.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = CoreBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_non_http_scheme() {
        let result = CoreBuilder::new().base_url("ftp://localhost").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_url() {
        let mock = MockTransport::new();
        let core = core_with(&mock);
        assert_eq!(
            core.resolve_url("/queue/api/json").unwrap().as_str(),
            "http://localhost/queue/api/json"
        );
        assert_eq!(
            core.resolve_url("queue/api/json").unwrap().as_str(),
            "http://localhost/queue/api/json"
        );
        assert_eq!(
            core.resolve_url("http://other:8080/x?y=1").unwrap().as_str(),
            "http://other:8080/x?y=1"
        );
    }

    #[test]
    fn test_resolve_url_keeps_context_path() {
        let core = JenkinsCore::builder()
            .base_url("https://ci.example.com/jenkins/")
            .transport(MockTransport::new())
            .build()
            .unwrap();
        assert_eq!(
            core.resolve_url("/job/a/build?delay=0").unwrap().as_str(),
            "https://ci.example.com/jenkins/job/a/build?delay=0"
        );
    }

    #[test]
    fn test_basic_auth_value() {
        let value = basic_auth_value("admin", "token").unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic YWRtaW46dG9rZW4=");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_new_request_attaches_auth_only_with_both_credentials() {
        let mock = MockTransport::new();
        let core = JenkinsCore::builder()
            .base_url("http://localhost")
            .user_name("admin")
            .transport(mock.clone())
            .build()
            .unwrap();
        let request = core.new_request(RequestSpec::get("/api/json")).unwrap();
        assert!(request.headers.get(AUTHORIZATION).is_none());

        let core = JenkinsCore::builder()
            .base_url("http://localhost")
            .basic_auth("admin", "token")
            .transport(mock)
            .build()
            .unwrap();
        let request = core.new_request(RequestSpec::get("/api/json")).unwrap();
        assert!(request.headers.get(AUTHORIZATION).is_some());
    }

    #[test]
    fn test_new_request_rejects_bad_header() {
        let mock = MockTransport::new();
        let core = core_with(&mock);
        let err = core
            .new_request(RequestSpec::get("/").header("bad header", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_crumb_policy_from_str() {
        assert_eq!("strict".parse::<CrumbPolicy>().unwrap(), CrumbPolicy::Strict);
        assert_eq!("Skip".parse::<CrumbPolicy>().unwrap(), CrumbPolicy::Skip);
        assert!("nope".parse::<CrumbPolicy>().is_err());
        assert_eq!(CrumbPolicy::Permissive.to_string(), "permissive");
    }

    #[test]
    fn test_new_request_keeps_repeated_headers() {
        let mock = MockTransport::new();
        let core = core_with(&mock);
        let request = core
            .new_request(
                RequestSpec::get("/")
                    .header("Accept", "application/json")
                    .header("Accept", "text/plain"),
            )
            .unwrap();
        let values: Vec<_> = request.headers.get_all("accept").iter().collect();
        assert_eq!(values.len(), 2);
    }

    fn unusable_crumb() -> Response {
        Response::new(200, r#"{"crumbRequestField":"","crumb":"x"}"#)
    }

    #[tokio::test]
    async fn test_unusable_crumb_is_skipped_when_permissive() {
        let mock = MockTransport::new();
        expect_crumb_response(&mock, "http://localhost", unusable_crumb());
        mock.expect(
            RequestMatcher::new(Method::POST, endpoint("http://localhost", "/job/a/build")),
            Response::new(201, ""),
        );

        let status = core_with(&mock)
            .request_expecting_status(RequestSpec::post("/job/a/build").expect(201))
            .await
            .unwrap();
        assert_eq!(status, 201);
        mock.assert_satisfied();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].headers.len(), 0);
    }

    #[tokio::test]
    async fn test_unusable_crumb_fails_when_strict() {
        let mock = MockTransport::new();
        expect_crumb_response(&mock, "http://localhost", unusable_crumb());
        let core = JenkinsCore::builder()
            .base_url("http://localhost")
            .crumb_policy(CrumbPolicy::Strict)
            .transport(mock.clone())
            .build()
            .unwrap();

        let err = core
            .request_expecting_status(RequestSpec::post("/job/a/build").expect(201))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Crumb(_)));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_every_mutating_method_carries_crumb() {
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            let mock = MockTransport::new();
            expect_crumb(&mock, "http://localhost");
            mock.expect(
                RequestMatcher::new(method.clone(), endpoint("http://localhost", "/resource")),
                Response::new(200, ""),
            );

            core_with(&mock)
                .request_expecting_status(RequestSpec::new(method.clone(), "/resource"))
                .await
                .unwrap();
            mock.assert_satisfied();

            let requests = mock.requests();
            assert_eq!(requests.len(), 2, "{method}");
            assert_eq!(requests[0].method, Method::GET);
            assert_eq!(requests[1].method, method);
            assert_eq!(
                requests[1].headers.get(MOCK_CRUMB_FIELD).unwrap(),
                MOCK_CRUMB,
                "{method}"
            );
        }
    }

    #[tokio::test]
    async fn test_request_with_response_returns_raw_response() {
        let mock = MockTransport::new();
        expect_crumb(&mock, "http://localhost");
        mock.expect(
            RequestMatcher::new(Method::POST, endpoint("http://localhost", "/job/a/logText")),
            Response::new(500, "partial")
                .with_header("X-More-Data", "true")
                .with_header("X-Text-Size", "7"),
        );

        let response = core_with(&mock)
            .request_with_response(RequestSpec::post("/job/a/logText"))
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.header("X-More-Data"), Some("true"));
        assert_eq!(response.header("X-Text-Size"), Some("7"));
        assert_eq!(response.text(), "partial");
        assert!(mock.requests()[1].headers.contains_key(MOCK_CRUMB_FIELD));
    }
}
