use serde::{Deserialize, Serialize};

use crate::TaskSpec;

/// Execution mode requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchType {
    /// Backend provisions compute on demand; no pre-provisioned hosts.
    #[default]
    ManagedServerless,
    /// Task is placed on hosts already registered with the cluster.
    Provisioned,
}

/// Launch request sent to a backend for one task spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskRequest {
    pub cluster: String,
    pub task_definition: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub launch_type: LaunchType,
    pub count: u32,
}

impl From<&TaskSpec> for RunTaskRequest {
    fn from(spec: &TaskSpec) -> Self {
        Self {
            cluster: spec.cluster_id.clone(),
            task_definition: spec.task_definition_id.clone(),
            subnet_ids: vec![spec.subnet_id.clone()],
            security_group_ids: vec![spec.security_group_id.clone()],
            launch_type: LaunchType::default(),
            count: 1,
        }
    }
}
