//! Error types for Magic Input

/// Result type alias using Magic Input's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Magic Input operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Detector construction errors (bad pattern, invalid table)
    #[error("detector error: {0}")]
    Detector(String),

    /// Configuration errors, including a missing escalation credential
    #[error("configuration error: {0}")]
    Config(String),

    /// The escalation request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The escalation service answered, but not with something usable
    #[error("service error: {0}")]
    Service(String),

    /// History load/save errors
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new detector error
    pub fn detector(msg: impl Into<String>) -> Self {
        Self::Detector(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Escalation failure category for this error, if it is one.
    ///
    /// Timeouts count as transport failures; a response body that could not
    /// be decoded counts as a service failure.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Config(_) => Some(FailureCategory::Configuration),
            Self::Transport(_) | Self::Timeout | Self::Io(_) => Some(FailureCategory::Transport),
            Self::Service(_) | Self::Serialization(_) => Some(FailureCategory::Service),
            Self::Detector(_) | Self::Persistence(_) | Self::Internal(_) => None,
        }
    }
}

/// Category of an escalation failure, as surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// No credential configured; the call was never attempted
    Configuration,
    /// Network failure or timeout
    Transport,
    /// Authentication rejected, bad status, or malformed response
    Service,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Transport => write!(f, "transport"),
            Self::Service => write!(f, "service"),
        }
    }
}
