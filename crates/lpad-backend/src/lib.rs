//! Concrete [`lpad_core::TaskBackend`] implementations.
//!
//! - `http` (default): JSON client for a container-orchestration control plane.
//! - `proc` (default): runs task definitions as local processes, for development and tests.

mod error;
pub use error::BackendConfigError;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpBackendConfig};

#[cfg(feature = "proc")]
mod proc;
#[cfg(feature = "proc")]
pub use proc::{ProcBackend, ProcCommand};
