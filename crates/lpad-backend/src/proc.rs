use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    process::Stdio,
    str::FromStr,
};

use async_trait::async_trait;
use lpad_core::{BackendError, TaskBackend};
use lpad_model::{RunTaskRequest, TaskHandle, TaskStatus};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    sync::Mutex,
};
use tracing::{debug, trace, warn};

use crate::error::BackendConfigError;

/// Local command standing in for a remote task definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl ProcCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl FromStr for ProcCommand {
    type Err = BackendConfigError;

    /// Whitespace-separated `program arg...`; no shell quoting.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| BackendConfigError::InvalidCommand(s.to_string()))?;

        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
            ..Default::default()
        })
    }
}

enum Tracked {
    Running(Child),
    Exited { code: i32, reason: Option<String> },
}

#[derive(Default)]
struct Tasks {
    by_id: HashMap<String, Tracked>,
    /// Exited task ids, oldest first.
    exited: VecDeque<String>,
}

impl Tasks {
    fn record_exit(&mut self, id: &str, retain: usize) {
        self.exited.push_back(id.to_string());
        while self.exited.len() > retain {
            if let Some(old) = self.exited.pop_front() {
                self.by_id.remove(&old);
            }
        }
    }
}

/// Runs each task definition as a local child process.
///
/// Launch spawns the command mapped to the request's task definition; status
/// stays `Running` until the child exits, then `Stopped` with its exit code.
/// Children are killed when the backend is dropped. Only the most recent
/// exited tasks stay queryable; older ones report `TaskNotFound`.
pub struct ProcBackend {
    commands: HashMap<String, ProcCommand>,
    tasks: Mutex<Tasks>,
    retain_exited: usize,
}

/// Exit code reported for a child terminated by a signal.
const SIGNAL_EXIT_CODE: i32 = -1;

const DEFAULT_RETAIN_EXITED: usize = 1024;

impl ProcBackend {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            tasks: Mutex::new(Tasks::default()),
            retain_exited: DEFAULT_RETAIN_EXITED,
        }
    }

    /// How many exited tasks keep their final status.
    pub fn with_retained_exited(mut self, retain: usize) -> Self {
        self.retain_exited = retain;
        self
    }

    /// Map a task definition id to a local command.
    pub fn with_command(mut self, definition: impl Into<String>, cmd: ProcCommand) -> Self {
        self.commands.insert(definition.into(), cmd);
        self
    }

    /// Parse `definition=program args...;definition=program args...`.
    pub fn from_definitions(raw: &str) -> Result<Self, BackendConfigError> {
        let mut backend = Self::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (definition, command) = entry
                .split_once('=')
                .ok_or_else(|| BackendConfigError::InvalidCommand(entry.to_string()))?;
            let definition = definition.trim();
            if definition.is_empty() {
                return Err(BackendConfigError::InvalidCommand(entry.to_string()));
            }
            backend = backend.with_command(definition, command.parse()?);
        }
        Ok(backend)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    fn command_for(&self, request: &RunTaskRequest) -> Result<Command, BackendError> {
        let cfg = self.commands.get(&request.task_definition).ok_or_else(|| {
            BackendError::Rejected(format!(
                "unknown task definition: {}",
                request.task_definition
            ))
        })?;

        let mut cmd = Command::new(&cfg.program);
        cmd.args(&cfg.args)
            .envs(cfg.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("LPAD_CLUSTER", &request.cluster)
            .env("LPAD_TASK_DEFINITION", &request.task_definition)
            .env("LPAD_SUBNETS", request.subnet_ids.join(","))
            .env("LPAD_SECURITY_GROUPS", request.security_group_ids.join(","))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &cfg.cwd {
            cmd.current_dir(cwd);
        }
        Ok(cmd)
    }
}

impl Default for ProcBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskBackend for ProcBackend {
    fn name(&self) -> &'static str {
        "proc"
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskHandle, BackendError> {
        let mut cmd = self.command_for(request)?;
        let mut child = cmd
            .spawn()
            .map_err(|e| BackendError::Rejected(format!("spawn: {e}")))?;

        let id = format!("proc/{}", uuid::Uuid::new_v4());
        if let Some(out) = child.stdout.take() {
            forward_lines(id.clone(), "stdout", out);
        }
        if let Some(err) = child.stderr.take() {
            forward_lines(id.clone(), "stderr", err);
        }

        debug!(task_id = %id, pid = ?child.id(), "spawned local task");
        self.tasks
            .lock()
            .await
            .by_id
            .insert(id.clone(), Tracked::Running(child));
        Ok(TaskHandle::new(id, request.cluster.clone()))
    }

    async fn describe_task(&self, handle: &TaskHandle) -> Result<TaskStatus, BackendError> {
        let mut tasks = self.tasks.lock().await;
        let tracked = tasks
            .by_id
            .get_mut(&handle.id)
            .ok_or_else(|| BackendError::TaskNotFound(handle.id.clone()))?;

        let (code, reason) = match tracked {
            Tracked::Exited { code, reason } => {
                return Ok(TaskStatus::Stopped {
                    exit_code: *code,
                    stopped_reason: reason.clone(),
                });
            }
            Tracked::Running(child) => match child.try_wait() {
                Ok(None) => return Ok(TaskStatus::Running),
                Ok(Some(status)) => match status.code() {
                    Some(0) => (0, None),
                    Some(code) => (code, Some(format!("exit code: {code}"))),
                    None => (SIGNAL_EXIT_CODE, Some("terminated by signal".to_string())),
                },
                Err(e) => return Err(BackendError::Unavailable(format!("wait: {e}"))),
            },
        };

        trace!(task_id = %handle.id, code, "local task exited");
        *tracked = Tracked::Exited {
            code,
            reason: reason.clone(),
        };
        tasks.record_exit(&handle.id, self.retain_exited);

        Ok(TaskStatus::Stopped {
            exit_code: code,
            stopped_reason: reason,
        })
    }
}

fn forward_lines<R>(task_id: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(target: "lpad.backend.proc", task_id = %task_id, stream, %line),
                Ok(None) => break,
                Err(e) => {
                    warn!(target: "lpad.backend.proc", task_id = %task_id, stream, error = %e, "output read failed");
                    break;
                }
            }
        }
    });
}
