mod task_spec;
pub use task_spec::TaskSpec;

mod task_handle;
pub use task_handle::TaskHandle;

mod task_status;
pub use task_status::TaskStatus;

mod task_outcome;
pub use task_outcome::{OutcomeKind, TaskOutcome};

mod run_request;
pub use run_request::{LaunchType, RunTaskRequest};

/// Identifier of a remote cluster that hosts tasks.
pub type ClusterId = String;

/// Separator between task entries in a configuration string.
pub const ENTRY_SEPARATOR: char = '|';

/// Separator between the fields of one task entry.
pub const FIELD_SEPARATOR: &str = "::";
