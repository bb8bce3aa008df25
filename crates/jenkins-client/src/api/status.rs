//! Status API.

use crate::core::JenkinsCore;
use crate::error::Result;
use crate::http::{Decoder, RequestSpec};
use crate::types::ServerStatus;

/// Header carrying the server version.
const VERSION_HEADER: &str = "X-Jenkins";

/// Status API client.
pub struct StatusApi {
    core: JenkinsCore,
}

impl StatusApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// Get the server status. The version comes from the response headers.
    pub async fn get(&self) -> Result<ServerStatus> {
        let response = self.core.request_checked(RequestSpec::get("/api/json")).await?;
        let mut status: ServerStatus = Decoder::Json.decode(&response.body)?;
        status.version = response
            .header(VERSION_HEADER)
            .unwrap_or_default()
            .to_string();
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::http::Response;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn test_get_status() {
        let mock = MockTransport::new();
        mock.expect(
            get("/api/json").basic_auth("admin", "token").with_headers(),
            Response::new(200, r#"{"nodeName":"master"}"#).with_header("X-Jenkins", "version"),
        );

        let status = client_with_auth(&mock, "admin", "token")
            .status()
            .get()
            .await
            .unwrap();
        assert_eq!(status.node_name, "master");
        assert_eq!(status.version, "version");
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_get_status_server_error() {
        let mock = MockTransport::new();
        mock.expect(get("/api/json"), Response::new(500, "boom"));

        let err = client(&mock).status().get().await.unwrap_err();
        assert!(err.is_server_error());
    }
}
