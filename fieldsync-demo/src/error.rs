use std::path::PathBuf;

use fieldsync::{FieldError, FormError};
use thiserror::Error;

/// Errors that end a demo session.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Form(#[from] FormError),
}
