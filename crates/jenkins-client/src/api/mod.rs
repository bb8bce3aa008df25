//! Per-resource API clients.

mod blueocean;
mod casc;
mod computer;
mod job;
mod plugin;
mod queue;
mod status;
mod user;

pub use blueocean::{
    BlueOceanApi, BranchFilter, BuildOption, DEFAULT_ORGANIZATION, GetBranchesOption,
    GetBuildOption, GetNodesOption, GetStepsOption, ReplayOption,
};
pub use casc::CascApi;
pub use computer::{ComputerApi, default_create_payload};
pub use job::{JobApi, parse_job_path};
pub use plugin::PluginApi;
pub use queue::QueueApi;
pub use status::StatusApi;
pub use user::UserApi;
