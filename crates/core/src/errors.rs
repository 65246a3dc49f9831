//! Error types for the SmartPower core crate.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure talking to the usage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkError {
    /// HTTP status when the backend answered with a non-success code.
    pub status: Option<u16>,
    pub message: String,
    pub timed_out: bool,
}

impl NetworkError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            timed_out: true,
        }
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.status, self.timed_out) {
            (Some(status), _) => write!(f, "HTTP {}: {}", status, self.message),
            (None, true) => write!(f, "timed out: {}", self.message),
            (None, false) => write!(f, "{}", self.message),
        }
    }
}

/// Errors surfaced by the synchronization subsystem.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Transport failure or non-success status from the backend.
    #[error("Network error: {0}")]
    Network(NetworkError),

    /// Malformed user input, rejected before any request is issued.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutation is already in flight.
    #[error("Another update is already in progress")]
    Busy,

    /// Local persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        Self::Network(err)
    }
}
