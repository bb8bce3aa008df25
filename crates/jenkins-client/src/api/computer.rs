//! Computer (agent) API.

use serde::Deserialize;

use crate::core::JenkinsCore;
use crate::error::{Error, Result};
use crate::http::{Decoder, RequestSpec};
use crate::types::ComputerList;

/// Work directory of agents created by [`ComputerApi::create`].
const DEFAULT_AGENT_WORK_DIR: &str = "/var/tmp/jenkins";

/// Agent class used for permanent agents.
const DUMB_SLAVE: &str = "hudson.slaves.DumbSlave";

/// Computer API client.
pub struct ComputerApi {
    core: JenkinsCore,
}

impl ComputerApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// List all agents.
    pub async fn list(&self) -> Result<ComputerList> {
        self.core
            .request_with_data(RequestSpec::get("/computer/api/json"))
            .await
    }

    /// Start an agent.
    pub async fn launch(&self, name: &str) -> Result<()> {
        let path = format!("/computer/{}/launchSlaveAgent", urlencoding::encode(name));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Remove an agent.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = format!("/computer/{}/doDelete", urlencoding::encode(name));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Secret an inbound agent connects with, read from its JNLP descriptor.
    pub async fn secret(&self, name: &str) -> Result<String> {
        let path = format!("/computer/{}/slave-agent.jnlp", urlencoding::encode(name));
        let jnlp: AgentJnlp = self
            .core
            .request_decoding(RequestSpec::get(path), Decoder::Xml)
            .await?;
        jnlp.application_desc
            .arguments
            .into_iter()
            .next()
            .ok_or_else(|| Error::Unexpected("JNLP descriptor has no application arguments".into()))
    }

    /// Agent log.
    pub async fn log(&self, name: &str) -> Result<String> {
        let path = format!(
            "/computer/{}/logText/progressiveText",
            urlencoding::encode(name)
        );
        self.core.request_text(RequestSpec::get(path)).await
    }

    /// Create a permanent inbound agent with default settings.
    pub async fn create(&self, name: &str) -> Result<()> {
        let spec = RequestSpec::post("/computer/createItem").form([("name", name), ("mode", DUMB_SLAVE)]);
        self.core.request_without_data(spec).await?;

        let spec = RequestSpec::post("/computer/doCreateItem").form(default_create_payload(name));
        self.core.request_without_data(spec).await?;
        Ok(())
    }
}

/// Form fields creating an inbound agent called `name`, labelled with the
/// local OS and architecture.
pub fn default_create_payload(name: &str) -> Vec<(&'static str, String)> {
    let labels = format!("{} {}", std::env::consts::OS, std::env::consts::ARCH);
    let json = serde_json::json!({
        "name": name,
        "nodeDescription": "",
        "numExecutors": "1",
        "remoteFS": DEFAULT_AGENT_WORK_DIR,
        "labelString": labels,
        "mode": "NORMAL",
        "launcher": {
            "$class": "hudson.slaves.JNLPLauncher",
            "workDirSettings": {
                "disabled": false,
                "workDirPath": "",
                "internalDir": "remoting",
                "failIfWorkDirIsMissing": false
            },
            "tunnel": "",
            "vmargs": ""
        },
        "type": DUMB_SLAVE
    });
    vec![
        ("name", name.to_string()),
        ("type", DUMB_SLAVE.to_string()),
        ("json", json.to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct AgentJnlp {
    #[serde(rename = "application-desc")]
    application_desc: ApplicationDesc,
}

#[derive(Debug, Deserialize)]
struct ApplicationDesc {
    #[serde(default, rename = "argument")]
    arguments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::http::{APPLICATION_FORM, Response};
    use crate::testing::MockTransport;

    const NAME: &str = "fake-name";

    #[tokio::test]
    async fn test_list() {
        let mock = MockTransport::new();
        mock.expect(
            get("/computer/api/json"),
            Response::new(
                200,
                r#"{"busyExecutors":0,"totalExecutors":2,"computer":[
                    {"displayName":"master","assignedLabels":[{"name":"master"}],"offlineCause":null},
                    {"displayName":"agent","offline":true,"offlineCause":{"timestamp":1,"description":"gone"}}
                ]}"#,
            ),
        );

        let computers = client(&mock).computers().list().await.unwrap();
        assert_eq!(computers.computer.len(), 2);
        assert!(computers.computer[1].offline);
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_launch_and_delete() {
        let mock = MockTransport::new();
        let launch = post(&mock, "/computer/fake-name/launchSlaveAgent");
        mock.expect(launch, Response::new(200, ""));
        let delete = post(&mock, "/computer/fake-name/doDelete");
        mock.expect(delete, Response::new(200, ""));

        let computers = client(&mock).computers();
        computers.launch(NAME).await.unwrap();
        computers.delete(NAME).await.unwrap();
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_secret_from_jnlp() {
        let mock = MockTransport::new();
        mock.expect(
            get("/computer/fake-name/slave-agent.jnlp"),
            Response::new(
                200,
                r#"<jnlp codebase="http://localhost/computer/fake-name/" spec="1.0+">
                    <information><title>Agent for fake-name</title></information>
                    <application-desc main-class="hudson.remoting.jnlp.Main">
                        <argument>fake-secret</argument>
                        <argument>fake-name</argument>
                    </application-desc>
                </jnlp>"#,
            ),
        );

        let secret = client(&mock).computers().secret(NAME).await.unwrap();
        assert_eq!(secret, "fake-secret");
    }

    #[tokio::test]
    async fn test_secret_without_arguments() {
        let mock = MockTransport::new();
        mock.expect(
            get("/computer/fake-name/slave-agent.jnlp"),
            Response::new(200, "<jnlp><application-desc></application-desc></jnlp>"),
        );

        let err = client(&mock).computers().secret(NAME).await.unwrap_err();
        assert!(matches!(err, Error::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_log() {
        let mock = MockTransport::new();
        mock.expect(
            get("/computer/fake-name/logText/progressiveText"),
            Response::new(200, "fake-log"),
        );
        assert_eq!(client(&mock).computers().log(NAME).await.unwrap(), "fake-log");

        let mock = MockTransport::new();
        mock.expect(
            get("/computer/fake-name/logText/progressiveText"),
            Response::new(500, ""),
        );
        assert!(client(&mock).computers().log(NAME).await.is_err());
    }

    #[tokio::test]
    async fn test_create_posts_two_forms() {
        let mock = MockTransport::new();
        let first = post(&mock, "/computer/createItem")
            .body("name=fake-name&mode=hudson.slaves.DumbSlave");
        mock.expect(first, Response::new(200, ""));

        let payload = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(default_create_payload(NAME))
            .finish();
        let second = post(&mock, "/computer/doCreateItem").body(payload);
        mock.expect(second, Response::new(200, ""));

        client(&mock).computers().create(NAME).await.unwrap();
        mock.assert_satisfied();
        let requests = mock.requests();
        assert!(requests.iter().filter(|r| r.method == reqwest::Method::POST).all(|r| {
            r.headers.get(reqwest::header::CONTENT_TYPE).unwrap() == APPLICATION_FORM
        }));
    }

    #[test]
    fn test_default_create_payload() {
        let payload = default_create_payload("agent");
        assert_eq!(payload[0], ("name", "agent".to_string()));
        let json: serde_json::Value = serde_json::from_str(&payload[2].1).unwrap();
        assert_eq!(json["remoteFS"], DEFAULT_AGENT_WORK_DIR);
        assert_eq!(json["launcher"]["$class"], "hudson.slaves.JNLPLauncher");
    }
}
