use std::time::Duration;

use async_trait::async_trait;
use lpad_core::{BackendError, TaskBackend};
use lpad_model::{RunTaskRequest, TaskHandle, TaskStatus};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::BackendConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpBackendConfig {
    /// Base URL of the control plane, e.g. `https://orchestrator.internal:8443`.
    pub endpoint: String,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Sent as a bearer token when set.
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            request_timeout_ms: 15_000,
            auth_token: None,
        }
    }
}

/// JSON-over-HTTP client for a container-orchestration control plane.
///
/// - launch: `POST {endpoint}/v1/clusters/{cluster}/tasks`
/// - status: `GET  {endpoint}/v1/clusters/{cluster}/tasks/{task}`
pub struct HttpBackend {
    client: Client,
    base: Url,
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunTaskResponse {
    #[serde(default)]
    tasks: Vec<LaunchedTask>,
    #[serde(default)]
    failures: Vec<LaunchFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchedTask {
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchFailure {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTaskResponse {
    last_status: String,
    #[serde(default)]
    containers: Vec<ContainerState>,
    #[serde(default)]
    stopped_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerState {
    #[serde(default)]
    exit_code: Option<i32>,
}

/// Exit code reported when a stopped task has no container exit code.
const MISSING_EXIT_CODE: i32 = -1;

impl HttpBackend {
    pub fn new(cfg: &HttpBackendConfig) -> Result<Self, BackendConfigError> {
        let base = Url::parse(&cfg.endpoint).map_err(|e| BackendConfigError::InvalidEndpoint {
            endpoint: cfg.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(BackendConfigError::InvalidEndpoint {
                endpoint: cfg.endpoint.clone(),
                reason: "not a base url".into(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base,
            auth_token: cfg.auth_token.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskHandle, BackendError> {
        let url = self.url(&["v1", "clusters", request.cluster.as_str(), "tasks"]);
        trace!(%url, "POST run task");

        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let body = read_body(response, || {
            BackendError::Rejected(format!(
                "cluster {} or task definition {} not found",
                request.cluster, request.task_definition
            ))
        })
        .await?;

        let parsed: RunTaskResponse = serde_json::from_str(&body).map_err(|e| {
            BackendError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
        })?;
        let task = parsed.tasks.into_iter().next().ok_or_else(|| {
            match parsed.failures.into_iter().next() {
                Some(failure) => BackendError::Rejected(failure.reason),
                None => BackendError::InvalidResponse("no task returned".into()),
            }
        })?;

        debug!(task_id = %task.task_id, "backend accepted task");
        Ok(TaskHandle::new(task.task_id, request.cluster.clone()))
    }

    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, BackendError> {
        let url = self.url(&[
            "v1",
            "clusters",
            handle.cluster_id.as_str(),
            "tasks",
            handle.id.as_str(),
        ]);
        trace!(%url, "GET describe task");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let body = read_body(response, || BackendError::TaskNotFound(handle.id.clone())).await?;

        let parsed: DescribeTaskResponse = serde_json::from_str(&body).map_err(|e| {
            BackendError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
        })?;
        Ok(map_status(parsed))
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    BackendError::Unavailable(e.to_string())
}

async fn read_body(
    response: reqwest::Response,
    not_found: impl FnOnce() -> BackendError,
) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    match status {
        s if s.is_success() => Ok(body),
        StatusCode::NOT_FOUND => Err(not_found()),
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            Err(BackendError::Unavailable(format!("{s}: {body}")))
        }
        s => Err(BackendError::Rejected(format!("{s}: {body}"))),
    }
}

fn map_status(resp: DescribeTaskResponse) -> TaskStatus {
    match resp.last_status.to_ascii_uppercase().as_str() {
        "STOPPED" => TaskStatus::Stopped {
            exit_code: resp
                .containers
                .first()
                .and_then(|c| c.exit_code)
                .unwrap_or(MISSING_EXIT_CODE),
            stopped_reason: resp.stopped_reason,
        },
        "RUNNING" | "DEACTIVATING" | "STOPPING" | "DEPROVISIONING" => TaskStatus::Running,
        _ => TaskStatus::Pending,
    }
}
