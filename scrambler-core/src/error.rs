//! Error types for the scrambler engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to start scrambler: {0}")]
    EngineStart(#[source] Box<Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Keyboard monitor error: {0}")]
    Monitor(String),

    #[error("Key injection failed: {0}")]
    Injection(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl Error {
    /// True when this error, or the error it wraps, is an OS permission denial
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::PermissionDenied(_) => true,
            Error::EngineStart(inner) => inner.is_permission_denied(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
