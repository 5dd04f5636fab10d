//! Seam between the orchestrator and a remote container-orchestration backend.
//!
//! The orchestrator only ever needs two operations: launch a task and ask for its status.
//! Concrete implementations (HTTP client, local processes, test fakes) live outside this crate.

use async_trait::async_trait;
use lpad_model::{RunTaskRequest, TaskHandle, TaskStatus};

use crate::error::BackendError;

#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Launch one task and return the handle used to poll it.
    ///
    /// A response that carries no task must be reported as an error, never as a handle.
    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskHandle, BackendError>;

    /// Current status of a previously launched task.
    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, BackendError>;
}
