//! Job API.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::Deserialize;

use crate::core::JenkinsCore;
use crate::error::{Error, Result};
use crate::http::{Request, RequestSpec};
use crate::multipart::Form;
use crate::types::{
    Build, BuildAndReturnOptions, Category, CreateJobPayload, IdentityBuild, InputItem,
    JenkinsItem, Job, JobLog, ParameterDefinition, SimplePipeline,
};

/// Job API client.
pub struct JobApi {
    core: JenkinsCore,
    parent: String,
}

impl JobApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self {
            core,
            parent: String::new(),
        }
    }

    /// Restrict [`JobApi::search`] to jobs below `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Find jobs by name and type.
    pub async fn search(
        &self,
        name: &str,
        kind: &str,
        start: u32,
        limit: u32,
    ) -> Result<Vec<JenkinsItem>> {
        let path = format!(
            "/items/list?name={}&type={}&start={start}&limit={limit}&parent={}",
            urlencoding::encode(name),
            urlencoding::encode(kind),
            urlencoding::encode(&self.parent)
        );
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Trigger a build without parameters.
    pub async fn build(&self, name: &str) -> Result<()> {
        let path = format!("{}/build", parse_job_path(name));
        self.core
            .request_without_data(RequestSpec::post(path).expect(201))
            .await?;
        Ok(())
    }

    /// Trigger a build with parameters.
    ///
    /// File parameters are uploaded as a multipart form, each part named by
    /// its local path; otherwise the parameters go in a url-encoded form.
    pub async fn build_with_params(&self, name: &str, parameters: &[ParameterDefinition]) -> Result<()> {
        let path = format!("{}/build", parse_job_path(name));

        let (files, values): (Vec<_>, Vec<_>) = parameters.iter().partition(|p| p.is_file());
        let json = match values.as_slice() {
            [single] => serde_json::to_string(single)?,
            many => serde_json::to_string(many)?,
        };
        let json = format!("{{\"parameter\": {json}}}");

        let spec = if files.is_empty() {
            RequestSpec::post(path).form([("json", json)])
        } else {
            let mut form = Form::new();
            for file in files {
                form = form.file(file.filepath.clone(), &file.filepath).await?;
            }
            RequestSpec::post(path).multipart(form.text("json", json))
        };
        self.core.request_without_data(spec.expect(201)).await?;
        Ok(())
    }

    /// Trigger a build through the restful endpoint and wait for it to
    /// start.
    pub async fn build_and_return(
        &self,
        name: &str,
        options: &BuildAndReturnOptions,
    ) -> Result<IdentityBuild> {
        let mut path = format!("{}/restFul/build?1=1", parse_job_path(name));
        if let Some(timeout) = options.timeout {
            path.push_str(&format!("&timeout={timeout}"));
        }
        if let Some(delay) = options.delay {
            path.push_str(&format!("&delay={delay}"));
        }
        if let Some(cause) = options.cause.as_deref().filter(|c| !c.is_empty()) {
            path.push_str(&format!("&identifyCause={}", urlencoding::encode(cause)));
        }
        self.core.request_with_data(RequestSpec::post(path)).await
    }

    /// Get a build, or the last one when `number` is `None`.
    pub async fn get_build(&self, name: &str, number: Option<u64>) -> Result<Build> {
        let path = format!("{}/{}/api/json", parse_job_path(name), build_ref(number));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    pub async fn disable(&self, name: &str) -> Result<()> {
        self.post_action(name, "disable").await
    }

    pub async fn enable(&self, name: &str) -> Result<()> {
        self.post_action(name, "enable").await
    }

    /// Abort a build, or the last one when `number` is `None`.
    pub async fn stop(&self, name: &str, number: Option<u64>) -> Result<()> {
        let path = format!("{}/{}/stop", parse_job_path(name), build_ref(number));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    pub async fn get_job(&self, name: &str) -> Result<Job> {
        let path = format!("{}/api/json", parse_job_path(name));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Add parameters to a simple pipeline. `parameters` is the JSON list
    /// the restful endpoint expects.
    pub async fn add_parameters(&self, name: &str, parameters: &str) -> Result<()> {
        let path = format!("{}/restFul/addParameter", parse_job_path(name));
        let spec = RequestSpec::post(path).form([("params", parameters)]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Remove parameters, by comma separated name, from a simple pipeline.
    pub async fn remove_parameters(&self, name: &str, parameters: &str) -> Result<()> {
        let path = format!(
            "{}/restFul/removeParameter?params={}",
            parse_job_path(name),
            urlencoding::encode(parameters)
        );
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Job types offered when creating an item.
    pub async fn job_type_categories(&self) -> Result<Vec<Category>> {
        #[derive(Deserialize)]
        struct Categories {
            #[serde(default)]
            categories: Vec<Category>,
        }
        let categories: Categories = self
            .core
            .request_with_data(RequestSpec::get("/view/all/itemCategories?depth=3"))
            .await?;
        Ok(categories.categories)
    }

    pub async fn get_pipeline(&self, name: &str) -> Result<SimplePipeline> {
        let path = format!("{}/restFul", parse_job_path(name));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Replace the script of a pipeline job.
    pub async fn update_pipeline(&self, name: &str, script: &str) -> Result<()> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("script", script)
            .finish();
        let path = format!("{}/restFul/update?{query}", parse_job_path(name));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Details of every build the job still lists, newest first.
    pub async fn history(&self, name: &str) -> Result<Vec<Build>> {
        let job = self.get_job(name).await?;
        let mut builds = Vec::with_capacity(job.builds.len());
        for build in &job.builds {
            builds.push(self.get_build(name, Some(build.number)).await?);
        }
        Ok(builds)
    }

    /// Delete one build.
    pub async fn delete_history(&self, name: &str, number: u64) -> Result<()> {
        let path = format!("{}/{number}/doDelete", parse_job_path(name));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Read the console log of a build from byte offset `start`.
    ///
    /// [`JobLog::has_more`] and [`JobLog::next_start`] come from the
    /// `X-More-Data` and `X-Text-Size` response headers; poll again from
    /// `next_start` while more data is expected.
    pub async fn log(&self, name: &str, number: Option<u64>, start: u64) -> Result<JobLog> {
        let path = format!(
            "{}/{}/logText/progressiveText?start={start}",
            parse_job_path(name),
            build_ref(number)
        );
        let mut request = Request::new(Method::GET, self.core.resolve_url(&path)?);
        self.core.auth_handle(&mut request).await?;
        let response = self.core.transport().round_trip(request).await?;
        if response.status != 200 {
            return Err(Error::StatusMismatch {
                expected: 200.into(),
                actual: response.status,
                body: response.text(),
            });
        }

        Ok(JobLog {
            has_more: response
                .header("X-More-Data")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            next_start: response
                .header("X-Text-Size")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            text: response.text(),
        })
    }

    /// Create a job at the top level.
    pub async fn create(&self, payload: &CreateJobPayload) -> Result<()> {
        self.create_in_folder(payload, "").await
    }

    /// Create a job inside `folder` (space separated path, see
    /// [`parse_job_path`]).
    pub async fn create_in_folder(&self, payload: &CreateJobPayload, folder: &str) -> Result<()> {
        let json = serde_json::to_string(payload)?;
        let path = format!("/view/all{}/createItem", parse_job_path(folder));
        let spec = RequestSpec::post(path)
            .form([
                ("json", json.as_str()),
                ("name", payload.name.as_str()),
                ("mode", payload.mode.as_str()),
                ("from", payload.from.as_str()),
            ])
            .expect([200, 302]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Delete a job.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = format!("{}/doDelete", parse_job_path(name));
        let spec = RequestSpec::post(path)
            .form_content_type()
            .expect([200, 302]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Input steps a pipeline build is waiting on.
    pub async fn input_actions(&self, name: &str, number: u64) -> Result<Vec<InputItem>> {
        let path = format!(
            "{}/{number}/wfapi/pendingInputActions",
            parse_job_path(name)
        );
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Proceed with, or abort, a pending input step.
    pub async fn submit_input(
        &self,
        name: &str,
        input_id: &str,
        number: u64,
        abort: bool,
        params: &BTreeMap<String, String>,
    ) -> Result<()> {
        let action = if abort { "abort" } else { "proceed" };
        let parameter: Vec<serde_json::Value> = params
            .iter()
            .map(|(name, value)| serde_json::json!({"name": name, "value": value}))
            .collect();
        let json = serde_json::to_string(&serde_json::json!({ "parameter": parameter }))?;
        let path = format!(
            "{}/{number}/input/{}/{action}?json={}",
            parse_job_path(name),
            urlencoding::encode(input_id),
            urlencoding::encode(&json)
        );
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    async fn post_action(&self, name: &str, action: &str) -> Result<()> {
        let path = format!("{}/{action}", parse_job_path(name));
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }
}

/// Turn a space separated job name (`folder sub job`) into its URL path
/// (`/job/folder/job/sub/job/job`).
///
/// Empty names and names that already are paths are returned unchanged.
pub fn parse_job_path(name: &str) -> String {
    if name.is_empty() || name.starts_with("/job/") || name.starts_with("job/") {
        return name.to_string();
    }
    name.split(' ').map(|item| format!("/job/{item}")).collect()
}

fn build_ref(number: Option<u64>) -> String {
    number.map_or_else(|| "lastBuild".to_string(), |n| n.to_string())
}
