//! In-memory transport for tests.
//!
//! ```
//! use jenkins_client::testing::{MockTransport, expect_crumb};
//! use jenkins_client::{JenkinsCore, RequestMatcher, RequestSpec, Response, Method};
//!
//! # async fn example() -> jenkins_client::Result<()> {
//! let mock = MockTransport::new();
//! expect_crumb(&mock, "http://localhost");
//! mock.expect(
//!     RequestMatcher::new(Method::POST, "http://localhost/job/a/build".parse().unwrap()),
//!     Response::new(201, ""),
//! );
//!
//! let core = JenkinsCore::builder()
//!     .base_url("http://localhost")
//!     .transport(mock.clone())
//!     .build()?;
//! core.request_without_data(RequestSpec::post("/job/a/build").expect(201)).await?;
//! mock.assert_satisfied();
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use crate::core::CRUMB_ISSUER_PATH;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::matcher::RequestMatcher;
use crate::transport::Transport;

/// Crumb field name served by [`expect_crumb`].
pub const MOCK_CRUMB_FIELD: &str = "CrumbRequestField";

/// Crumb value served by [`expect_crumb`].
pub const MOCK_CRUMB: &str = "Crumb";

/// A request seen by the mock, body buffered.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug)]
struct Expectation {
    matcher: RequestMatcher,
    response: Response,
    used: bool,
}

#[derive(Debug, Default)]
struct State {
    expectations: Vec<Expectation>,
    requests: Vec<RecordedRequest>,
}

/// Transport answering from a list of expectations.
///
/// Each expectation answers exactly one request; the first unused one whose
/// matcher accepts the request wins. Requests nothing matches fail with a
/// transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer the next request accepted by `matcher` with `response`.
    pub fn expect(&self, matcher: RequestMatcher, response: Response) -> &Self {
        self.state().expectations.push(Expectation {
            matcher,
            response,
            used: false,
        });
        self
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// Descriptions of expectations that were never used.
    pub fn unmatched(&self) -> Vec<String> {
        self.state()
            .expectations
            .iter()
            .filter(|e| !e.used)
            .map(|e| format!("{} {}", e.matcher.method(), e.matcher.url()))
            .collect()
    }

    /// Panic unless every expectation answered a request.
    pub fn assert_satisfied(&self) {
        let unmatched = self.unmatched();
        assert!(unmatched.is_empty(), "unmet expectations: {unmatched:?}");
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // a panicking test must not hide the state from the next assertion
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, mut request: Request) -> Result<Response> {
        let body = request.body.buffer().await?;

        let mut state = self.state();
        state.requests.push(RecordedRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body,
        });
        let found = state
            .expectations
            .iter_mut()
            .find(|e| !e.used && e.matcher.matches_buffered(&request));
        match found {
            Some(expectation) => {
                expectation.used = true;
                Ok(expectation.response.clone())
            }
            None => Err(Error::transport(format!(
                "no expectation matches {} {}",
                request.method, request.url
            ))),
        }
    }
}

/// Expect one crumb request and answer it with [`MOCK_CRUMB_FIELD`] /
/// [`MOCK_CRUMB`].
pub fn expect_crumb(mock: &MockTransport, root_url: &str) {
    expect_crumb_response(
        mock,
        root_url,
        Response::new(
            200,
            format!(r#"{{"crumbRequestField":"{MOCK_CRUMB_FIELD}","crumb":"{MOCK_CRUMB}"}}"#),
        ),
    );
}

/// Expect one crumb request and answer it with `response`.
pub fn expect_crumb_response(mock: &MockTransport, root_url: &str, response: Response) {
    mock.expect(
        RequestMatcher::new(Method::GET, endpoint(root_url, CRUMB_ISSUER_PATH)),
        response,
    );
}

/// Join `root_url` and `path` the way the core does.
///
/// # Panics
///
/// Panics when the result is not a valid URL; meant for test fixtures.
pub fn endpoint(root_url: &str, path: &str) -> Url {
    let joined = format!(
        "{}/{}",
        root_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).unwrap_or_else(|e| panic!("invalid test URL '{joined}': {e}"))
}
