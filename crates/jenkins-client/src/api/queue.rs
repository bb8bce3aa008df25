//! Queue API.

use crate::core::JenkinsCore;
use crate::error::Result;
use crate::http::RequestSpec;
use crate::types::JobQueue;

/// Queue API client.
pub struct QueueApi {
    core: JenkinsCore,
}

impl QueueApi {
    pub(crate) fn new(core: JenkinsCore) -> Self {
        Self { core }
    }

    /// Get the build queue.
    pub async fn get(&self) -> Result<JobQueue> {
        self.core
            .request_with_data(RequestSpec::get("/queue/api/json"))
            .await
    }

    /// Cancel a queued item.
    ///
    /// Success is a redirect. 200 and 404 are accepted too: the item may
    /// have left the queue before the cancel arrived.
    pub async fn cancel(&self, id: i64) -> Result<()> {
        let spec = RequestSpec::post(format!("/queue/cancelItem?id={id}")).expect(302);
        match self.core.request_without_data(spec).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.status(), Some(200 | 404)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
