use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the apimaster supervisor
#[derive(Debug, Error)]
pub enum MasterError {
    // Discovery errors
    #[error("Service root directory not found: {0}")]
    RootNotFound(PathBuf),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Launch errors
    #[error("Failed to spawn service: {0}")]
    SpawnError(String),

    #[error("Service already registered: {0}")]
    ServiceAlreadyRegistered(String),

    #[error("Port {0} already held by service {1}")]
    PortConflict(u16, String),

    // Shutdown errors
    #[error("Failed to stop service {0}: {1}")]
    StopError(String, String),

    #[error("Signal error: {0}")]
    SignalError(String),

    // Log-related errors
    #[error("Log error: {0}")]
    LogError(String),

    #[error("Failed to open log file: {0}")]
    LogFileError(String),

    #[error("Log rotation failed: {0}")]
    LogRotationError(String),

    // Pid file errors
    #[error("Pid file error: {0}")]
    PidFileError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for apimaster operations
pub type Result<T> = std::result::Result<T, MasterError>;
