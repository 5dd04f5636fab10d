use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ClusterId, FIELD_SEPARATOR, ModelError};

/// Placement of one remote job: where it runs and with which network settings.
///
/// Built once from a configuration entry and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Cluster the task is launched into.
    pub cluster_id: ClusterId,
    /// Task definition (image, command, resources) known to the backend.
    pub task_definition_id: String,
    /// Network subnet the task is attached to.
    pub subnet_id: String,
    /// Security group applied to the task's network interface.
    pub security_group_id: String,
}

impl TaskSpec {
    pub fn new(
        cluster_id: impl Into<String>,
        task_definition_id: impl Into<String>,
        subnet_id: impl Into<String>,
        security_group_id: impl Into<String>,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            task_definition_id: task_definition_id.into(),
            subnet_id: subnet_id.into(),
            security_group_id: security_group_id.into(),
        }
    }
}

impl FromStr for TaskSpec {
    type Err = ModelError;

    /// Parse a single `cluster::definition::subnet::security-group` entry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(FIELD_SEPARATOR).map(str::trim).collect();

        match fields.as_slice() {
            [cluster, definition, subnet, group]
                if fields.iter().all(|f| !f.is_empty()) =>
            {
                Ok(TaskSpec::new(*cluster, *definition, *subnet, *group))
            }
            _ => Err(ModelError::ConfigEntryInvalid {
                entry: s.trim().to_string(),
                fields: fields.iter().filter(|f| !f.is_empty()).count(),
            }),
        }
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_id, self.task_definition_id)
    }
}
