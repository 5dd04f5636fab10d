//! Scripted in-memory backend for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use lpad_model::{RunTaskRequest, TaskHandle, TaskStatus};
use tokio::time::Instant;

use crate::{TaskBackend, error::BackendError};

/// Backend whose answers are queued per cluster.
///
/// Launches succeed unless a failure was queued; statuses are popped in order and the last one repeats.
#[derive(Default)]
pub struct ScriptedBackend {
    submit_failures: Mutex<HashMap<String, VecDeque<BackendError>>>,
    statuses: Mutex<HashMap<String, VecDeque<Result<TaskStatus, BackendError>>>>,
    run_calls: Mutex<Vec<(Instant, RunTaskRequest)>>,
    describe_calls: Mutex<Vec<(Instant, TaskHandle)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_submits(self, cluster: &str, errors: impl IntoIterator<Item = BackendError>) -> Self {
        self.submit_failures
            .lock()
            .unwrap()
            .entry(cluster.to_string())
            .or_default()
            .extend(errors);
        self
    }

    pub fn statuses(self, cluster: &str, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(cluster.to_string())
            .or_default()
            .extend(statuses.into_iter().map(Ok));
        self
    }

    pub fn status_error(self, cluster: &str, error: BackendError) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .entry(cluster.to_string())
            .or_default()
            .push_back(Err(error));
        self
    }

    pub fn run_calls(&self) -> Vec<(Instant, RunTaskRequest)> {
        self.run_calls.lock().unwrap().clone()
    }

    pub fn describe_calls(&self) -> Vec<(Instant, TaskHandle)> {
        self.describe_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskHandle, BackendError> {
        let n = {
            let mut calls = self.run_calls.lock().unwrap();
            calls.push((Instant::now(), request.clone()));
            calls.len()
        };

        if let Some(err) = self
            .submit_failures
            .lock()
            .unwrap()
            .get_mut(&request.cluster)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        Ok(TaskHandle::new(
            format!("task/{}-{}-{n}", request.cluster, request.task_definition),
            request.cluster.clone(),
        ))
    }

    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, BackendError> {
        self.describe_calls
            .lock()
            .unwrap()
            .push((Instant::now(), handle.clone()));

        let mut statuses = self.statuses.lock().unwrap();
        let Some(queue) = statuses.get_mut(&handle.cluster_id) else {
            return Ok(TaskStatus::Pending);
        };
        match queue.len() {
            0 => Ok(TaskStatus::Pending),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap_or(Ok(TaskStatus::Pending)),
        }
    }
}
