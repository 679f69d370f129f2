use thiserror::Error;

/// Unified error type for version calculation
#[derive(Error, Debug)]
pub enum CalcVerError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("No commits reachable from HEAD")]
    NoCommits,

    #[error("Ambiguous base version: {0}")]
    AmbiguousVersion(String),

    #[error("Calculation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-calcver
pub type Result<T> = std::result::Result<T, CalcVerError>;

impl CalcVerError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        CalcVerError::Configuration(msg.into())
    }

    /// Create a repository error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        CalcVerError::Repository(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        CalcVerError::Version(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        CalcVerError::Branch(msg.into())
    }

    /// Create an ambiguous-version error with context
    pub fn ambiguous(msg: impl Into<String>) -> Self {
        CalcVerError::AmbiguousVersion(msg.into())
    }
}
