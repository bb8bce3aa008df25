//! Round-trip transports.
//!
//! The core never talks to the network directly; it hands a resolved
//! [`Request`] to a [`Transport`] and gets a buffered [`Response`] back.
//! Timeouts and connection reuse belong to the transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::http::{Body, Request, Response};

/// Sends one request and returns its response.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, request: Request) -> Result<Response>;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing `reqwest` client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Build a client with the given timeout and user agent.
    ///
    /// Redirects are not followed: the server answers successful form posts
    /// with 302 and callers check for that status.
    pub fn with_options(timeout: Option<Duration>, user_agent: &str) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }

    /// The underlying `reqwest` client.
    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(&self, request: Request) -> Result<Response> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.http.request(method, url).headers(headers);
        builder = match body {
            Body::Empty => builder,
            Body::Bytes(bytes) => builder.body(bytes),
            Body::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder.send().await.map_err(Error::from)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
