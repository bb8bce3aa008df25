//! Configuration-as-code plugin API.

use crate::core::JenkinsCore;
use crate::error::Result;
use crate::http::RequestSpec;

/// Configuration-as-code API client.
pub struct CascApi {
    core: JenkinsCore,
}

impl CascApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// Reload the configuration from its current source.
    pub async fn reload(&self) -> Result<()> {
        self.post("/configuration-as-code/reload").await
    }

    /// Apply the configuration.
    pub async fn apply(&self) -> Result<()> {
        self.post("/configuration-as-code/apply").await
    }

    /// Export the running configuration as YAML.
    pub async fn export(&self) -> Result<String> {
        self.core
            .request_text(RequestSpec::post("/configuration-as-code/export"))
            .await
    }

    /// JSON schema of the configuration.
    pub async fn schema(&self) -> Result<String> {
        self.core
            .request_text(RequestSpec::post("/configuration-as-code/schema"))
            .await
    }

    /// Validate a new configuration source (path or URL) without applying it.
    pub async fn check_new_source(&self, source: &str) -> Result<()> {
        let path = format!(
            "/configuration-as-code/checkNewSource?newSource={}",
            urlencoding::encode(source)
        );
        self.post(&path).await
    }

    /// Replace the configuration source and apply it.
    pub async fn replace(&self, source: &str) -> Result<()> {
        let json = serde_json::json!({ "newSource": source }).to_string();
        let spec = RequestSpec::post("/configuration-as-code/replace")
            .form([("_.newSource", source), ("json", json.as_str())]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    async fn post(&self, path: &str) -> Result<()> {
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::http::Response;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn test_normal_cases() {
        let mock = MockTransport::new();
        for path in ["/configuration-as-code/reload", "/configuration-as-code/apply"] {
            let matcher = post(&mock, path);
            mock.expect(matcher, Response::new(200, ""));
        }
        for path in ["/configuration-as-code/export", "/configuration-as-code/schema"] {
            let matcher = post(&mock, path);
            mock.expect(matcher, Response::new(200, "sample"));
        }
        let check = post(&mock, "/configuration-as-code/checkNewSource?newSource=source");
        mock.expect(check, Response::new(200, ""));
        let replace = post(&mock, "/configuration-as-code/replace").body(
            "_.newSource=source&json=%7B%22newSource%22%3A%22source%22%7D",
        );
        mock.expect(replace, Response::new(200, ""));

        let casc = client(&mock).casc();
        casc.reload().await.unwrap();
        casc.apply().await.unwrap();
        assert_eq!(casc.export().await.unwrap(), "sample");
        assert_eq!(casc.schema().await.unwrap(), "sample");
        casc.check_new_source("source").await.unwrap();
        casc.replace("source").await.unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_check_new_source_encodes_url() {
        let mock = MockTransport::new();
        let matcher = post(
            &mock,
            "/configuration-as-code/checkNewSource?newSource=https%3A%2F%2Fexample.com%2Fjenkins.yaml",
        );
        mock.expect(matcher, Response::new(200, ""));

        client(&mock)
            .casc()
            .check_new_source("https://example.com/jenkins.yaml")
            .await
            .unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_export_and_schema_errors() {
        let mock = MockTransport::new();
        for path in ["/configuration-as-code/export", "/configuration-as-code/schema"] {
            let matcher = post(&mock, path);
            mock.expect(matcher, Response::new(500, ""));
        }

        let casc = client(&mock).casc();
        assert!(casc.export().await.is_err());
        assert!(casc.schema().await.is_err());
    }
}
