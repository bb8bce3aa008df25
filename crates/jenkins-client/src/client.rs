//! Entry point handing out the per-resource APIs.

use crate::api::{
    BlueOceanApi, CascApi, ComputerApi, JobApi, PluginApi, QueueApi, StatusApi, UserApi,
};
use crate::core::{CoreBuilder, JenkinsCore};

/// Client for one automation server.
///
/// Cheap to clone; every API shares the same [`JenkinsCore`].
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    core: JenkinsCore,
}

impl JenkinsClient {
    pub fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// Start building the underlying core.
    pub fn builder() -> CoreBuilder {
        JenkinsCore::builder()
    }

    /// The shared request core.
    pub fn core(&self) -> &JenkinsCore {
        &self.core
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Server status.
    pub fn status(&self) -> StatusApi {
        StatusApi::new(self.core.clone())
    }

    /// Build queue.
    pub fn queue(&self) -> QueueApi {
        QueueApi::new(self.core.clone())
    }

    /// Agents.
    pub fn computers(&self) -> ComputerApi {
        ComputerApi::new(self.core.clone())
    }

    /// Jobs at the top level.
    pub fn jobs(&self) -> JobApi {
        JobApi::new(self.core.clone())
    }

    /// Pipelines through the Blue Ocean REST API, default organization.
    pub fn blue_ocean(&self) -> BlueOceanApi {
        BlueOceanApi::new(self.core.clone())
    }

    /// Plugin manager and update center.
    pub fn plugins(&self) -> PluginApi {
        PluginApi::new(self.core.clone())
    }

    /// Users. Calls about "the current user" use the configured user name.
    pub fn users(&self) -> UserApi {
        UserApi::new(self.core.clone())
    }

    /// Configuration as code.
    pub fn casc(&self) -> CascApi {
        CascApi::new(self.core.clone())
    }
}

impl From<JenkinsCore> for JenkinsClient {
    fn from(core: JenkinsCore) -> Self {
        Self::new(core)
    }
}
