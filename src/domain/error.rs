use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Required input is absent: an empty prompt, a missing shapefile.
    #[error("{0}")]
    InputMissing(String),

    /// A prerequisite outside the input itself is absent.
    #[error("{0}")]
    EnvironmentMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn input_missing(msg: impl Into<String>) -> Self {
        Self::InputMissing(msg.into())
    }

    pub fn environment_missing(msg: impl Into<String>) -> Self {
        Self::EnvironmentMissing(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Errors the user can fix by supplying input or installing something.
    /// These exit with status 1 and a one-line message instead of a fault.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InputMissing(_) | Self::EnvironmentMissing(_))
    }
}
