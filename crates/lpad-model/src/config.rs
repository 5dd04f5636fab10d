use tracing::{debug, warn};

use crate::{ENTRY_SEPARATOR, TaskSpec};

/// Parse a `|`-separated list of `cluster::definition::subnet::security-group` entries.
///
/// Invalid entries are logged and skipped; this never fails the whole batch.
/// Blank entries (e.g. from a trailing `|`) are ignored silently.
/// An empty result is a valid no-op configuration.
pub fn parse_task_specs(raw: &str) -> Vec<TaskSpec> {
    let specs: Vec<TaskSpec> = raw
        .split(ENTRY_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<TaskSpec>() {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(error = %e, "skipping invalid task entry");
                None
            }
        })
        .collect();

    debug!(count = specs.len(), "parsed task specs");
    specs
}
