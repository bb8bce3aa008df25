//! Typed HTTP client for the Jenkins REST API.
//!
//! A [`JenkinsCore`] resolves paths against the server URL, attaches basic
//! auth, fetches a CSRF crumb before every mutating request and checks the
//! response status against what each call expects. [`JenkinsClient`] hands
//! out one typed API per resource on top of it.
//!
//! # Example
//!
//! ```no_run
//! use jenkins_client::{JenkinsClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = JenkinsClient::new(
//!     JenkinsClient::builder()
//!         .base_url("http://localhost:8080")
//!         .basic_auth("admin", "api-token")
//!         .build()?,
//! );
//!
//! // Server version comes from the X-Jenkins header
//! let status = client.status().get().await?;
//! println!("{} {}", status.node_name, status.version);
//!
//! // Trigger a job in a folder and read its console output
//! let jobs = client.jobs();
//! jobs.build("folder app").await?;
//! let log = jobs.log("folder app", None, 0).await?;
//! print!("{}", log.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! [`testing::MockTransport`] replaces the network: register
//! [`RequestMatcher`]s with canned responses and inject the mock with
//! [`CoreBuilder::transport`].

pub mod api;
pub mod client;
pub mod core;
pub mod error;
pub mod http;
pub mod matcher;
pub mod multipart;
pub mod testing;
pub mod transport;
pub mod types;
pub mod util;

pub use client::JenkinsClient;
pub use core::{CoreBuilder, Crumb, CrumbPolicy, JenkinsCore};
pub use error::{Error, Result};
pub use http::{Body, Decoder, ExpectedStatus, Request, RequestSpec, Response};
pub use matcher::{RequestMatcher, headers_match, queries_match};
pub use multipart::Form;
pub use reqwest::Method;
pub use transport::{ReqwestTransport, Transport};
pub use types::*;
