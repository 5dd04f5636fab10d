use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ClusterId;

/// Opaque identifier the backend returns for one launched task instance.
///
/// It is the only key used for status polling and is never reused across submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub id: String,
    pub cluster_id: ClusterId,
}

impl TaskHandle {
    pub fn new(id: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cluster_id: cluster_id.into(),
        }
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
