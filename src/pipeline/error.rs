//! Pipeline errors and their classification at the invocation boundary

use crate::notify::NotifyError;
use crate::store::StoreError;
use crate::window::WindowError;
use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse error class reported to callers and used for the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// Bad configuration; retrying will not help
    Configuration,
    /// Source or store unavailable; a later run may succeed
    Transient,
    /// Bug or invariant violation
    Internal,
}

impl ErrorClass {
    /// Process exit code (sysexits: EX_CONFIG, EX_TEMPFAIL, EX_SOFTWARE)
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorClass::Configuration => 78,
            ErrorClass::Transient => 75,
            ErrorClass::Internal => 70,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Configuration => write!(f, "configuration"),
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

/// Errors that fail a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(String),
    #[error("window: {0}")]
    Window(#[from] WindowError),
    #[error("source: {0}")]
    Source(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("notifier: {0}")]
    Notify(#[from] NotifyError),
}

impl PipelineError {
    pub fn source_failure(err: anyhow::Error) -> Self {
        PipelineError::Source(format!("{:#}", err))
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Config(_) => ErrorClass::Configuration,
            PipelineError::Window(WindowError::InvalidConfig(_)) => ErrorClass::Configuration,
            PipelineError::Window(_) => ErrorClass::Internal,
            PipelineError::Source(_) => ErrorClass::Transient,
            PipelineError::Store(StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                ErrorClass::Internal
            }
            PipelineError::Store(StoreError::Sqlite(_)) => ErrorClass::Transient,
            PipelineError::Store(_) => ErrorClass::Internal,
            PipelineError::Notify(NotifyError::MissingToken(_)) => ErrorClass::Configuration,
            PipelineError::Notify(_) => ErrorClass::Transient,
        }
    }
}
