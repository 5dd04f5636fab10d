use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid task entry {entry:?}: expected 4 non-empty fields separated by '::', got {fields}")]
    ConfigEntryInvalid { entry: String, fields: usize },
}
