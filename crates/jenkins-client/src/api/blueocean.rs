//! Pipelines through the Blue Ocean REST API.
//!
//! Nested folders map to repeated `pipelines/<name>` segments; branch names
//! are percent-encoded as a single path segment, so `feature/a` becomes
//! `feature%2Fa`.

use serde::Serialize;

use crate::core::JenkinsCore;
use crate::error::Result;
use crate::http::{APPLICATION_JSON, RequestSpec};
use crate::types::{
    JenkinsItem, Parameter, Pipeline, PipelineBranch, PipelineNode, PipelineRun, PipelineStep,
};

/// Organization every server has.
pub const DEFAULT_ORGANIZATION: &str = "jenkins";

/// Node limit used when [`GetNodesOption::limit`] is not set.
const DEFAULT_NODES_LIMIT: u32 = 10000;

/// Options for [`BlueOceanApi::build`].
#[derive(Debug, Clone, Default)]
pub struct BuildOption {
    /// Folders followed by the pipeline name.
    pub pipelines: Vec<String>,
    pub branch: Option<String>,
    /// `None` sends no body; `Some` sends `{"parameters": [...]}`, even when
    /// empty.
    pub parameters: Option<Vec<Parameter>>,
}

/// Options for [`BlueOceanApi::get_build`].
#[derive(Debug, Clone, Default)]
pub struct GetBuildOption {
    /// Folders followed by the pipeline name.
    pub pipelines: Vec<String>,
    pub branch: Option<String>,
    pub run_id: String,
}

/// Options for [`BlueOceanApi::get_nodes`].
#[derive(Debug, Clone, Default)]
pub struct GetNodesOption {
    /// Folders followed by the pipeline name.
    pub pipelines: Vec<String>,
    pub branch: Option<String>,
    pub run_id: String,
    pub limit: Option<u32>,
}

/// Options for [`BlueOceanApi::get_steps`].
#[derive(Debug, Clone, Default)]
pub struct GetStepsOption {
    pub folders: Vec<String>,
    pub pipeline_name: String,
    pub branch: Option<String>,
    pub run_id: String,
    /// Only the steps of this node.
    pub node_id: Option<String>,
}

/// Options for [`BlueOceanApi::replay`].
#[derive(Debug, Clone, Default)]
pub struct ReplayOption {
    /// Folders followed by the pipeline name.
    pub folders: Vec<String>,
    pub branch: Option<String>,
    pub run_id: String,
}

/// Which branches [`BlueOceanApi::get_branches`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFilter {
    /// Branches of the origin repository.
    Origin,
    /// Pull requests.
    PullRequests,
}

impl BranchFilter {
    fn as_str(self) -> &'static str {
        match self {
            BranchFilter::Origin => "origin",
            BranchFilter::PullRequests => "pull-requests",
        }
    }
}

/// Options for [`BlueOceanApi::get_branches`].
#[derive(Debug, Clone, Default)]
pub struct GetBranchesOption {
    pub folders: Vec<String>,
    pub pipeline_name: String,
    pub filter: Option<BranchFilter>,
    pub start: u32,
    pub limit: u32,
}

/// Blue Ocean API client.
pub struct BlueOceanApi {
    core: JenkinsCore,
    organization: String,
}

impl BlueOceanApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self {
            core,
            organization: DEFAULT_ORGANIZATION.to_string(),
        }
    }

    /// Use another organization.
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    /// Search pipelines by name, folders excluded.
    pub async fn search(&self, name: &str, start: u32, limit: u32) -> Result<Vec<JenkinsItem>> {
        let path = format!(
            "/blue/rest/search/?q=pipeline:*{name}*;type:pipeline;organization:{};\
             excludedFromFlattening=jenkins.branch.MultiBranchProject,\
             com.cloudbees.hudson.plugins.folder.AbstractFolder\
             &filter=no-folders&start={start}&limit={limit}",
            self.organization
        );
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Run a pipeline.
    pub async fn build(&self, option: &BuildOption) -> Result<PipelineRun> {
        let mut spec = json_spec(RequestSpec::post(self.build_path(option)));
        if let Some(parameters) = &option.parameters {
            #[derive(Serialize)]
            struct Body<'a> {
                parameters: &'a [Parameter],
            }
            spec = spec.body(serde_json::to_vec(&Body { parameters })?);
        }
        self.core.request_with_data(spec).await
    }

    /// Get one run.
    pub async fn get_build(&self, option: &GetBuildOption) -> Result<PipelineRun> {
        let spec = json_spec(RequestSpec::get(self.get_build_path(option)));
        self.core.request_with_data(spec).await
    }

    /// Get a pipeline inside `folders`.
    pub async fn get_pipeline(&self, name: &str, folders: &[&str]) -> Result<Pipeline> {
        let path = self.get_pipeline_path(name, folders);
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// List the pipelines of the organization, or of a nested folder.
    pub async fn get_pipelines(&self, folders: &[&str]) -> Result<Vec<Pipeline>> {
        let path = if folders.is_empty() {
            format!("/blue/rest/organizations/{}/pipelines", self.organization)
        } else {
            format!("{}/pipelines/", self.pipeline_base(folders))
        };
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// List the runs of a pipeline inside `folders`.
    pub async fn get_pipeline_runs(&self, name: &str, folders: &[&str]) -> Result<Vec<PipelineRun>> {
        let path = format!("{}/runs/", self.get_pipeline_path(name, folders));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// List the branches of a multi-branch pipeline.
    pub async fn get_branches(&self, option: &GetBranchesOption) -> Result<Vec<PipelineBranch>> {
        let path = self.get_branches_path(option);
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// List the nodes (stages) of a run.
    pub async fn get_nodes(&self, option: &GetNodesOption) -> Result<Vec<PipelineNode>> {
        let spec = json_spec(RequestSpec::get(self.get_nodes_path(option)));
        self.core.request_with_data(spec).await
    }

    /// List the steps of a run, or of one node.
    pub async fn get_steps(&self, option: &GetStepsOption) -> Result<Vec<PipelineStep>> {
        let path = self.get_steps_path(option);
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Replay a run.
    pub async fn replay(&self, option: &ReplayOption) -> Result<PipelineRun> {
        let spec = json_spec(RequestSpec::post(self.get_replay_path(option)));
        self.core.request_with_data(spec).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────────────────

    fn pipeline_base<S: AsRef<str>>(&self, pipelines: &[S]) -> String {
        format!(
            "/blue/rest/organizations/{}/{}",
            self.organization,
            pipelines_path(pipelines)
        )
    }

    fn runs_base<S: AsRef<str>>(&self, pipelines: &[S], branch: Option<&str>) -> String {
        format!("{}/{}runs/", self.pipeline_base(pipelines), branch_path(branch))
    }

    pub(crate) fn build_path(&self, option: &BuildOption) -> String {
        self.runs_base(&option.pipelines, option.branch.as_deref())
    }

    pub(crate) fn get_build_path(&self, option: &GetBuildOption) -> String {
        format!(
            "{}{}/",
            self.runs_base(&option.pipelines, option.branch.as_deref()),
            option.run_id
        )
    }

    pub(crate) fn get_nodes_path(&self, option: &GetNodesOption) -> String {
        format!(
            "{}{}/nodes/?limit={}",
            self.runs_base(&option.pipelines, option.branch.as_deref()),
            option.run_id,
            option.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_NODES_LIMIT)
        )
    }

    pub(crate) fn get_replay_path(&self, option: &ReplayOption) -> String {
        format!(
            "{}{}/replay/",
            self.runs_base(&option.folders, option.branch.as_deref()),
            option.run_id
        )
    }

    pub(crate) fn get_pipeline_path(&self, name: &str, folders: &[&str]) -> String {
        self.pipeline_base(&with_name(folders, name))
    }

    pub(crate) fn get_steps_path(&self, option: &GetStepsOption) -> String {
        let pipelines = with_name(&option.folders, &option.pipeline_name);
        let mut path = format!(
            "{}{}/",
            self.runs_base(&pipelines, option.branch.as_deref()),
            option.run_id
        );
        if let Some(node) = option.node_id.as_deref().filter(|n| !n.is_empty()) {
            path.push_str(&format!("nodes/{node}/"));
        }
        path.push_str("steps/");
        path
    }

    pub(crate) fn get_branches_path(&self, option: &GetBranchesOption) -> String {
        let pipelines = with_name(&option.folders, &option.pipeline_name);
        let mut query = Vec::new();
        if let Some(filter) = option.filter {
            query.push(format!("filter={}", filter.as_str()));
        }
        if option.start > 0 {
            query.push(format!("start={}", option.start));
        }
        if option.limit > 0 {
            query.push(format!("limit={}", option.limit));
        }
        let mut path = format!("{}/branches/", self.pipeline_base(&pipelines));
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        path
    }
}

fn json_spec(spec: RequestSpec) -> RequestSpec {
    spec.header("Content-Type", APPLICATION_JSON)
}

/// `["a", "b"]` to `pipelines/a/pipelines/b`.
fn pipelines_path<S: AsRef<str>>(pipelines: &[S]) -> String {
    pipelines
        .iter()
        .map(|p| format!("pipelines/{}", p.as_ref()))
        .collect::<Vec<_>>()
        .join("/")
}

fn branch_path(branch: Option<&str>) -> String {
    match branch.filter(|b| !b.is_empty()) {
        Some(branch) => format!("branches/{}/", urlencoding::encode(branch)),
        None => String::new(),
    }
}

fn with_name<S: AsRef<str>>(folders: &[S], name: &str) -> Vec<String> {
    folders
        .iter()
        .map(|f| f.as_ref().to_string())
        .chain(std::iter::once(name.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::http::Response;
    use crate::testing::MockTransport;

    fn api(mock: &std::sync::Arc<MockTransport>) -> BlueOceanApi {
        client(mock).blue_ocean()
    }

    fn pipelines(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    const QUEUED: &str = r#"{"expectedBuildNumber": 1, "id": "3", "enQueueTime": null}"#;

    #[test]
    fn test_build_path() {
        let api = api(&MockTransport::new());
        let mut option = BuildOption {
            pipelines: pipelines(&["pipelineA"]),
            ..Default::default()
        };
        assert_eq!(
            api.build_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/runs/"
        );
        option.branch = Some("featureA".into());
        assert_eq!(
            api.build_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/featureA/runs/"
        );
        option.branch = Some("feature/a".into());
        assert_eq!(
            api.build_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/feature%2Fa/runs/"
        );
    }

    #[test]
    fn test_get_build_and_nodes_paths() {
        let api = api(&MockTransport::new());
        let option = GetBuildOption {
            pipelines: pipelines(&["pipelineA"]),
            branch: Some("feature/a".into()),
            run_id: "123".into(),
        };
        assert_eq!(
            api.get_build_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/feature%2Fa/runs/123/"
        );

        let mut option = GetNodesOption {
            pipelines: pipelines(&["pipelineA"]),
            branch: Some("main".into()),
            run_id: "123".into(),
            limit: None,
        };
        assert_eq!(
            api.get_nodes_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/main/runs/123/nodes/?limit=10000"
        );
        option.limit = Some(456);
        assert_eq!(
            api.get_nodes_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/main/runs/123/nodes/?limit=456"
        );
    }

    #[test]
    fn test_replay_path() {
        let api = api(&MockTransport::new());
        let mut option = ReplayOption {
            folders: pipelines(&["pipelineA"]),
            branch: Some("main".into()),
            run_id: "123".into(),
        };
        assert_eq!(
            api.get_replay_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/main/runs/123/replay/"
        );
        option.branch = None;
        option.folders = pipelines(&["folderA", "pipelineA"]);
        assert_eq!(
            api.get_replay_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/folderA/pipelines/pipelineA/runs/123/replay/"
        );
    }

    #[test]
    fn test_pipeline_path() {
        let api = api(&MockTransport::new());
        assert_eq!(
            api.get_pipeline_path("pipeline1", &[]),
            "/blue/rest/organizations/jenkins/pipelines/pipeline1"
        );
        assert_eq!(
            api.get_pipeline_path("pipeline1", &["folder1", "folder2", "folder3"]),
            "/blue/rest/organizations/jenkins/pipelines/folder1/pipelines/folder2/pipelines/folder3/pipelines/pipeline1"
        );
    }

    #[test]
    fn test_steps_path() {
        let api = api(&MockTransport::new());
        let mut option = GetStepsOption {
            pipeline_name: "pipelineA".into(),
            run_id: "123".into(),
            ..Default::default()
        };
        assert_eq!(
            api.get_steps_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/runs/123/steps/"
        );
        option.branch = Some("release%2Fv3.2".into());
        assert_eq!(
            api.get_steps_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/release%252Fv3.2/runs/123/steps/"
        );
        option.branch = None;
        option.folders = pipelines(&["folder1"]);
        option.node_id = Some("456".into());
        assert_eq!(
            api.get_steps_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/folder1/pipelines/pipelineA/runs/123/nodes/456/steps/"
        );
    }

    #[test]
    fn test_branches_path() {
        let api = api(&MockTransport::new());
        let mut option = GetBranchesOption {
            pipeline_name: "pipelineA".into(),
            ..Default::default()
        };
        assert_eq!(
            api.get_branches_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/"
        );
        option.filter = Some(BranchFilter::Origin);
        option.start = 123;
        option.limit = 456;
        assert_eq!(
            api.get_branches_path(&option),
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/?filter=origin&start=123&limit=456"
        );
    }

    #[tokio::test]
    async fn test_search() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/search/"),
            Response::new(
                200,
                r#"[{"name":"fake","displayName":"fake","description":null,"type":"WorkflowJob"}]"#,
            ),
        );
        let items = api(&mock).search("fake", 0, 50).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "fake");
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_build_without_parameters_sends_no_body() {
        let mock = MockTransport::new();
        let matcher = post(
            &mock,
            "/blue/rest/organizations/jenkins/pipelines/fakePipeline/runs/",
        );
        mock.expect(matcher, Response::new(200, QUEUED));

        let run = api(&mock)
            .build(&BuildOption {
                pipelines: pipelines(&["fakePipeline"]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(run.id, "3");
        assert!(run.enqueue_time.is_none());
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_build_with_parameters() {
        let parameters = vec![Parameter {
            name: "this_is_a_name".into(),
            value: "this_is_a_value".into(),
        }];
        for parameters in [parameters, Vec::new()] {
            let body = serde_json::to_vec(&serde_json::json!({ "parameters": &parameters })).unwrap();
            let mock = MockTransport::new();
            let matcher = post(
                &mock,
                "/blue/rest/organizations/jenkins/pipelines/fakePipeline/runs/",
            )
            .body(body);
            mock.expect(matcher, Response::new(200, QUEUED));

            let run = api(&mock)
                .build(&BuildOption {
                    pipelines: pipelines(&["fakePipeline"]),
                    branch: None,
                    parameters: Some(parameters),
                })
                .await
                .unwrap();
            assert_eq!(run.id, "3");
            mock.assert_satisfied();
        }
    }

    #[tokio::test]
    async fn test_build_error() {
        let mock = MockTransport::new();
        let matcher = post(
            &mock,
            "/blue/rest/organizations/jenkins/pipelines/fakePipeline/runs/",
        );
        mock.expect(
            matcher,
            Response::new(400, r#"{"message":"parameters.name is required element","code":400}"#),
        );
        let err = api(&mock)
            .build(&BuildOption {
                pipelines: pipelines(&["fakePipeline"]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_get_build_error() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/fakePipeline/runs/1/"),
            Response::new(500, r#"{"message":"Failed"}"#),
        );
        let result = api(&mock)
            .get_build(&GetBuildOption {
                pipelines: pipelines(&["fakePipeline"]),
                branch: None,
                run_id: "1".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_nodes() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/pipelineA/runs/123/nodes/"),
            Response::new(
                200,
                r#"[{"displayName":"build","durationInMillis":219,"edges":[{"id":"9"}],
                    "id":"3","result":"SUCCESS","startTime":"2021-09-05T15:15:08.719-0700","state":"FINISHED"}]"#,
            ),
        );
        let nodes = api(&mock)
            .get_nodes(&GetNodesOption {
                pipelines: pipelines(&["pipelineA"]),
                run_id: "123".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "3");
        assert_eq!(nodes[0].edges[0].id, "9");
    }

    #[tokio::test]
    async fn test_get_pipelines() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines"),
            Response::new(200, "[]"),
        );
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/folder1/pipelines/folder2/pipelines/"),
            Response::new(200, r#"[{"name":"test","fullName":"folder1/folder2/test","latestRun":null}]"#),
        );

        let api = api(&mock);
        assert!(api.get_pipelines(&[]).await.unwrap().is_empty());
        let nested = api.get_pipelines(&["folder1", "folder2"]).await.unwrap();
        assert_eq!(nested[0].name, "test");
        mock.assert_satisfied();
    }

    #[tokio::test]
    async fn test_get_pipeline_and_runs() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/folder1/pipelines/pipelineA"),
            Response::new(200, r#"{"name":"pipelineA"}"#),
        );
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/folder1/pipelines/pipelineA/runs/"),
            Response::new(200, r#"[{"id":"1","result":"SUCCESS","state":"FINISHED"}]"#),
        );

        let api = api(&mock);
        let pipeline = api.get_pipeline("pipelineA", &["folder1"]).await.unwrap();
        assert_eq!(pipeline.name, "pipelineA");
        let runs = api.get_pipeline_runs("pipelineA", &["folder1"]).await.unwrap();
        assert_eq!(runs[0].result.as_deref(), Some("SUCCESS"));
    }

    #[tokio::test]
    async fn test_get_branches() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/"),
            Response::new(
                200,
                r#"[{"disabled":false,"name":"v0.0.1","weatherScore":100,"latestRun":null,
                    "branch":{"isPrimary":false,"issues":[],"url":"https://example.com/tree/v0.0.1"}}]"#,
            ),
        );
        let branches = api(&mock)
            .get_branches(&GetBranchesOption {
                pipeline_name: "pipelineA".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let branch = &branches[0];
        assert_eq!(branch.name, "v0.0.1");
        assert_eq!(branch.weather_score, 100);
        assert!(branch.latest_run.is_none());
        assert_eq!(
            branch.branch.as_ref().unwrap().url,
            "https://example.com/tree/v0.0.1"
        );

        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/"),
            Response::new(400, "Invalid Pipeline name"),
        );
        let result = api(&mock)
            .get_branches(&GetBranchesOption {
                pipeline_name: "pipelineA".into(),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_steps() {
        let mock = MockTransport::new();
        mock.expect(
            get("/blue/rest/organizations/jenkins/pipelines/pipelineA/runs/123/steps/"),
            Response::new(
                200,
                r#"[{"displayName":"Shell Script","durationInMillis":70,"id":"5","result":"SUCCESS",
                    "startTime":"2021-10-02T10:37:30.443+0800"}]"#,
            ),
        );
        let steps = api(&mock)
            .get_steps(&GetStepsOption {
                pipeline_name: "pipelineA".into(),
                run_id: "123".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(steps[0].id, "5");
        assert_eq!(steps[0].duration_in_millis, 70);
        assert_eq!(steps[0].display_name, "Shell Script");
    }

    #[tokio::test]
    async fn test_replay() {
        let mock = MockTransport::new();
        let matcher = post(
            &mock,
            "/blue/rest/organizations/jenkins/pipelines/pipelineA/branches/bug%2Fux-334/runs/123/replay/",
        );
        mock.expect(
            matcher,
            Response::new(
                200,
                r#"{"id":"64","expectedBuildNumber":10,"pipeline":"bug%2FUX-334","queuedTime":"2016-06-29T14:11:52.191-0700"}"#,
            ),
        );
        let run = api(&mock)
            .replay(&ReplayOption {
                folders: pipelines(&["pipelineA"]),
                branch: Some("bug/ux-334".into()),
                run_id: "123".into(),
            })
            .await
            .unwrap();
        assert_eq!(run.id, "64");
        assert_eq!(run.expected_build_number, Some(10));
        mock.assert_satisfied();
    }
}
