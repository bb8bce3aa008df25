//! Plugin manager and update center API.

use std::path::Path;

use crate::core::JenkinsCore;
use crate::error::Result;
use crate::http::RequestSpec;
use crate::multipart::Form;
use crate::types::{AvailablePluginList, InstalledPluginList, UpdateCenterSite};

/// Multipart field the upload endpoint reads the plugin archive from.
const UPLOAD_FIELD: &str = "@name";

/// Plugin API client.
pub struct PluginApi {
    core: JenkinsCore,
}

impl PluginApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// Plugins offered for installation.
    pub async fn available(&self) -> Result<AvailablePluginList> {
        self.core
            .request_with_data(RequestSpec::get("/pluginManager/plugins"))
            .await
    }

    /// Installed plugins. `depth` is raised to at least 1 so dependencies
    /// are included.
    pub async fn installed(&self, depth: u32) -> Result<InstalledPluginList> {
        let path = format!("/pluginManager/api/json?depth={}", depth.max(1));
        self.core.request_with_data(RequestSpec::get(path)).await
    }

    /// Install plugins by short name.
    pub async fn install(&self, names: &[&str]) -> Result<()> {
        let query = names
            .iter()
            .map(|name| format!("plugin.{}=", urlencoding::encode(name)))
            .collect::<Vec<_>>()
            .join("&");
        let path = format!("/pluginManager/install?{query}");
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Uninstall a plugin.
    pub async fn uninstall(&self, name: &str) -> Result<()> {
        let path = format!(
            "/pluginManager/plugin/{}/doUninstall",
            urlencoding::encode(name)
        );
        self.core.request_without_data(RequestSpec::post(path)).await?;
        Ok(())
    }

    /// Upload a plugin archive (`.hpi`/`.jpi`) from disk.
    ///
    /// The server redirects to the update center on success.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<()> {
        let form = Form::new().file(UPLOAD_FIELD, path).await?;
        let spec = RequestSpec::post("/pluginManager/uploadPlugin")
            .multipart(form)
            .expect([200, 302]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// The default update site, with pending updates and available plugins.
    pub async fn update_center(&self) -> Result<UpdateCenterSite> {
        self.core
            .request_with_data(RequestSpec::get(
                "/updateCenter/site/default/api/json?pretty=true&depth=2",
            ))
            .await
    }

    /// Point the default update site at `url`.
    pub async fn set_update_center_site(&self, url: &str) -> Result<()> {
        let spec = RequestSpec::post("/pluginManager/siteConfigure").form([("site", url)]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Install or remove the certificate of the update center mirror.
    pub async fn set_mirror_certificate(&self, enable: bool) -> Result<()> {
        let path = if enable {
            "/update-center-mirror/use"
        } else {
            "/update-center-mirror/remove"
        };
        let spec = RequestSpec::post(path).form_content_type();
        self.core.request_without_data(spec).await?;
        Ok(())
    }

    /// Ask the server to refresh update-site metadata.
    pub async fn check_updates(&self) -> Result<()> {
        let spec = RequestSpec::post("/pluginManager/checkUpdatesServer").expect([200, 302]);
        self.core.request_without_data(spec).await?;
        Ok(())
    }
}
