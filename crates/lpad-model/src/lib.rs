//! Shared data model for the launchpad task orchestrator.
//!
//! Everything in this crate is plain data: task placement specs, backend handles,
//! observed statuses, final outcomes and the request shape sent to a backend.

mod domain;
pub use domain::*;

mod config;
pub use config::parse_task_specs;

mod error;
pub use error::ModelError;
