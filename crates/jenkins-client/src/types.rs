//! Request and response types for the automation server API.
//!
//! The server's JSON is camelCase and sparse: most fields may be missing and
//! many may be `null`, so nearly everything defaults.

use serde::{Deserialize, Serialize};

/// Parameter type of a plain string build parameter.
pub const STRING_PARAMETER_DEFINITION: &str = "StringParameterDefinition";

/// Parameter type of a file build parameter.
pub const FILE_PARAMETER_DEFINITION: &str = "FileParameterDefinition";

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Server status from the root API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerStatus {
    pub node_name: String,
    pub node_description: Option<String>,
    pub num_executors: u32,
    pub use_security: bool,
    /// Server version, read from the `X-Jenkins` response header.
    #[serde(skip_deserializing)]
    pub version: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Queue
// ─────────────────────────────────────────────────────────────────────────────

/// The build queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueue {
    pub items: Vec<QueueItem>,
}

/// One waiting build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueItem {
    pub id: i64,
    pub blocked: bool,
    pub buildable: bool,
    pub pending: bool,
    pub stuck: bool,
    pub params: Option<String>,
    pub url: String,
    pub why: Option<String>,
    pub buildable_start_milliseconds: i64,
    pub in_queue_since: i64,
    pub actions: Vec<CauseAction>,
}

/// Collection of causes attached to a queue item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CauseAction {
    pub causes: Vec<Cause>,
}

/// Why a build was triggered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cause {
    pub upstream_url: Option<String>,
    pub upstream_project: Option<String>,
    pub upstream_build: Option<i64>,
    pub short_description: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Computers
// ─────────────────────────────────────────────────────────────────────────────

/// All agents plus executor totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComputerList {
    pub busy_executors: u32,
    pub total_executors: u32,
    pub computer: Vec<Computer>,
}

/// One agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Computer {
    pub display_name: String,
    pub description: Option<String>,
    pub assigned_labels: Vec<Label>,
    pub idle: bool,
    pub jnlp_agent: bool,
    pub launch_supported: bool,
    pub manual_launch_allowed: bool,
    pub num_executors: u32,
    pub offline: bool,
    pub offline_cause: Option<OfflineCause>,
    pub offline_cause_reason: Option<String>,
    pub temporarily_offline: bool,
}

/// Label assigned to an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
}

/// Why an agent is offline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineCause {
    pub timestamp: i64,
    pub description: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Jobs
// ─────────────────────────────────────────────────────────────────────────────

/// Search result item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JenkinsItem {
    pub name: String,
    pub display_name: Option<String>,
    pub url: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub buildable: bool,
    pub building: bool,
    pub in_queue: bool,
    pub parameterized: bool,
    pub disabled: bool,
    pub full_name: Option<String>,
    pub weather_score: Option<i32>,
    pub parameters: Vec<ParameterDefinition>,
}

/// A job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_class")]
    pub class: String,
    pub name: String,
    pub url: String,
    pub color: Option<String>,
    pub buildable: bool,
    pub concurrent_build: bool,
    pub next_build_number: u64,
    pub builds: Vec<SimpleJobBuild>,
    pub property: Vec<ParametersDefinitionProperty>,
}

impl Job {
    /// All parameter definitions declared by the job's properties.
    pub fn parameter_definitions(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.property.iter().flat_map(|p| &p.parameter_definitions)
    }
}

/// Job property holding parameter definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParametersDefinitionProperty {
    pub parameter_definitions: Vec<ParameterDefinition>,
}

/// A build parameter, as declared by a job or as sent with a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    /// Local file to upload, for file parameters.
    #[serde(rename = "file", skip_serializing_if = "String::is_empty")]
    pub filepath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_parameter_value: Option<ParameterValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter: String,
}

impl ParameterDefinition {
    /// A string parameter with a value.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: STRING_PARAMETER_DEFINITION.to_string(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// A file parameter uploading `path`.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FILE_PARAMETER_DEFINITION.to_string(),
            filepath: path.into(),
            ..Default::default()
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FILE_PARAMETER_DEFINITION
    }
}

/// Default or actual value of a parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub job_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub number: String,
}

/// Build reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleJobBuild {
    pub number: u64,
    pub url: String,
}

/// Build details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Build {
    pub number: u64,
    pub url: String,
    pub id: String,
    pub display_name: String,
    pub full_display_name: String,
    pub description: Option<String>,
    pub building: bool,
    pub result: Option<String>,
    pub duration: i64,
    pub estimated_duration: i64,
    pub timestamp: i64,
    pub keep_log: bool,
    pub queue_id: i64,
    pub previous_build: Option<SimpleJobBuild>,
    pub next_build: Option<SimpleJobBuild>,
}

/// A build triggered through the restful build endpoint, with its cause.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityBuild {
    pub build: Build,
    pub cause: IdentityCause,
}

/// Cause identifying a triggered build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityCause {
    pub uuid: String,
    pub short_description: String,
    pub message: String,
}

/// Options for [`JobApi::build_and_return`](crate::api::JobApi::build_and_return).
#[derive(Debug, Clone, Default)]
pub struct BuildAndReturnOptions {
    /// Cause text attached to the build.
    pub cause: Option<String>,
    /// Seconds to wait for the build to start.
    pub timeout: Option<u32>,
    /// Quiet period in seconds.
    pub delay: Option<u32>,
}

/// Script of a pipeline job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplePipeline {
    pub script: String,
    pub sandbox: bool,
}

/// A group of job types offered by the "new item" page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub items: Vec<CategoryItem>,
    pub min_to_show: i32,
    pub order: i32,
}

/// One job type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryItem {
    pub display_name: String,
    pub description: String,
    pub order: i32,
    pub class: String,
}

/// A chunk of a build's console log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLog {
    /// Whether the build is still writing output.
    pub has_more: bool,
    /// Offset to request the next chunk from.
    pub next_start: u64,
    pub text: String,
}

/// Payload for creating a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJobPayload {
    pub name: String,
    /// Job type class name (e.g. `org.jenkinsci.plugins.workflow.job.WorkflowJob`).
    pub mode: String,
    /// Existing job to copy, if any.
    pub from: String,
}

/// A pending input step of a pipeline build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputItem {
    pub id: String,
    pub message: String,
    pub proceed_text: String,
    pub abort_url: String,
    pub proceed_url: String,
    pub redirect_approval_url: String,
    pub inputs: Vec<ParameterDefinition>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Blue Ocean
// ─────────────────────────────────────────────────────────────────────────────

/// Name/value build parameter for Blue Ocean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// A pipeline run (or a freshly queued one).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: String,
    pub pipeline: Option<String>,
    pub result: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "enQueueTime")]
    pub enqueue_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_in_millis: Option<i64>,
    pub estimated_duration_in_millis: Option<i64>,
    pub expected_build_number: Option<u64>,
    pub queued_time: Option<String>,
}

/// A pipeline or folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pipeline {
    pub name: String,
    pub display_name: String,
    pub full_name: String,
    pub full_display_name: String,
    pub organization: String,
    pub disabled: bool,
    pub weather_score: i32,
    pub estimated_duration_in_millis: i64,
    pub latest_run: Option<PipelineRun>,
    pub parameters: Vec<ParameterDefinition>,
}

/// A branch of a multi-branch pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineBranch {
    pub name: String,
    pub display_name: String,
    pub full_name: String,
    pub full_display_name: String,
    pub organization: String,
    pub disabled: bool,
    pub weather_score: i32,
    pub estimated_duration_in_millis: i64,
    pub latest_run: Option<PipelineRun>,
    pub branch: Option<BranchInfo>,
}

/// SCM details of a branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BranchInfo {
    pub is_primary: bool,
    pub url: String,
    pub issues: Vec<serde_json::Value>,
}

/// A stage or parallel branch of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineNode {
    pub id: String,
    pub display_name: String,
    pub result: Option<String>,
    pub state: Option<String>,
    pub start_time: Option<String>,
    pub duration_in_millis: i64,
    pub edges: Vec<Edge>,
}

/// Link to a following node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Edge {
    pub id: String,
}

/// A step of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineStep {
    pub id: String,
    pub display_name: String,
    pub result: Option<String>,
    pub state: Option<String>,
    pub start_time: Option<String>,
    pub duration_in_millis: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins
// ─────────────────────────────────────────────────────────────────────────────

/// Plugins offered by the plugin manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailablePluginList {
    pub status: String,
    pub data: Vec<AvailablePlugin>,
}

/// One available plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvailablePlugin {
    pub name: String,
    pub title: String,
    pub version: Option<String>,
    pub installed: bool,
    pub compatible: Option<bool>,
}

/// Installed plugins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstalledPluginList {
    pub plugins: Vec<InstalledPlugin>,
}

/// One installed plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub short_name: String,
    pub long_name: Option<String>,
    pub version: String,
    pub has_update: bool,
    #[serde(alias = "enabled")]
    pub enable: bool,
    pub active: bool,
    pub dependencies: Vec<PluginDependency>,
}

/// Dependency of an installed plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginDependency {
    pub short_name: String,
    pub version: String,
    pub optional: bool,
}

/// The default update site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateCenterSite {
    pub id: String,
    pub url: String,
    pub connection_check_url: Option<String>,
    pub data_timestamp: i64,
    pub has_updates: bool,
    pub updates: Vec<CenterPlugin>,
    pub availables: Vec<CenterPlugin>,
}

/// A plugin as seen by the update site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CenterPlugin {
    pub name: String,
    pub title: String,
    pub version: String,
    pub source_id: String,
    pub required_core: String,
    pub installed: Option<CenterInstalled>,
}

/// Installed state of an update-site plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CenterInstalled {
    pub active: bool,
    pub backup_version: Option<String>,
    pub has_update: bool,
    pub version: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub description: Option<String>,
    pub absolute_url: String,
}

/// Form submitted to create a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserForCreate {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub fullname: String,
    pub email: String,
}

/// Result of generating an API token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    pub status: String,
    pub data: TokenData,
}

/// The generated token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenData {
    pub token_name: String,
    pub token_uuid: String,
    pub token_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_tolerates_nulls_and_unknown_fields() {
        let queue: JobQueue = serde_json::from_str(
            r#"{
                "_class": "hudson.model.Queue",
                "discoverableItems": [],
                "items": [{
                    "actions": [],
                    "blocked": false,
                    "buildable": true,
                    "id": 62,
                    "inQueueSince": 1567753826770,
                    "params": "",
                    "stuck": true,
                    "task": {"_class": "x"},
                    "url": "queue/item/62/",
                    "why": null,
                    "buildableStartMilliseconds": 1567753826770,
                    "pending": false
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.items[0].id, 62);
        assert!(queue.items[0].why.is_none());
    }

    #[test]
    fn test_parameter_serialization_skips_empty_fields() {
        let value = serde_json::to_value(ParameterDefinition::string("name", "value")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "name", "type": "StringParameterDefinition", "value": "value"})
        );
    }

    #[test]
    fn test_job_parameter_definitions() {
        let job: Job = serde_json::from_str(
            r#"{
                "_class": "org.jenkinsci.plugins.workflow.job.WorkflowJob",
                "name": "a",
                "property": [
                    {"_class": "other"},
                    {"parameterDefinitions": [{"name": "p", "type": "StringParameterDefinition",
                        "defaultParameterValue": {"name": "p", "value": true}}]}
                ]
            }"#,
        )
        .unwrap();
        let names: Vec<&str> = job.parameter_definitions().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p"]);
    }

    #[test]
    fn test_installed_plugin_accepts_enabled_alias() {
        let plugin: InstalledPlugin =
            serde_json::from_str(r#"{"shortName": "git", "enabled": true}"#).unwrap();
        assert!(plugin.enable);
    }
}
