use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BurstError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Could not resolve {target}: {source}")]
    ResolveError {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No address found for {target}")]
    NoAddressError { target: String },

    #[error("Could not open socket to {target} after {attempts} attempt(s): {source}")]
    ConnectError {
        target: String,
        attempts: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Send to {peer} failed: {source}")]
    SendError {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Reading reply from {peer} failed: {source}")]
    ReceiveError {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Connecting to {peer} timed out after {after_ms}ms")]
    TimeoutError { peer: SocketAddr, after_ms: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Task {} panicked: {message}", .task.map_or_else(|| "?".to_string(), |t| t.to_string()))]
    TaskPanicked { task: Option<usize>, message: String },

    #[error("Burst aborted after task {task} failed: {source}")]
    AbortedAfterFailure {
        task: usize,
        #[source]
        source: Box<BurstError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Io,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BurstError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BurstError::ResolveError { .. }
            | BurstError::NoAddressError { .. }
            | BurstError::ConnectError { .. }
            | BurstError::SendError { .. }
            | BurstError::ReceiveError { .. }
            | BurstError::TimeoutError { .. } => ErrorCategory::Network,
            BurstError::ConfigError { .. }
            | BurstError::MissingConfigError { .. }
            | BurstError::InvalidConfigValueError { .. }
            | BurstError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BurstError::IoError(_) | BurstError::SerializationError(_) | BurstError::CsvError(_) => {
                ErrorCategory::Io
            }
            BurstError::TaskPanicked { .. } => ErrorCategory::Internal,
            BurstError::AbortedAfterFailure { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一連線失敗只影響該任務
            BurstError::ConnectError { .. }
            | BurstError::SendError { .. }
            | BurstError::ReceiveError { .. }
            | BurstError::TimeoutError { .. } => ErrorSeverity::Medium,
            BurstError::ResolveError { .. } | BurstError::NoAddressError { .. } => {
                ErrorSeverity::High
            }
            BurstError::AbortedAfterFailure { .. }
            | BurstError::ConfigError { .. }
            | BurstError::MissingConfigError { .. }
            | BurstError::InvalidConfigValueError { .. }
            | BurstError::ConfigValidationError { .. }
            | BurstError::IoError(_)
            | BurstError::SerializationError(_)
            | BurstError::CsvError(_) => ErrorSeverity::High,
            BurstError::TaskPanicked { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BurstError::ResolveError { target, .. } | BurstError::NoAddressError { target } => {
                format!("Check that the host in '{}' is spelled correctly and resolvable", target)
            }
            BurstError::ConnectError { target, .. } => {
                format!("Make sure the daemon is listening on {}", target)
            }
            BurstError::SendError { .. } => {
                "The daemon closed the connection early; check its logs".to_string()
            }
            BurstError::ReceiveError { .. } => {
                "The payload was sent but no reply arrived; retry without --await-reply".to_string()
            }
            BurstError::TimeoutError { .. } => {
                "Increase --connect-timeout-ms or lower --workers".to_string()
            }
            BurstError::MissingConfigError { field } => {
                format!("Create {} or point --config at an existing file", field)
            }
            BurstError::ConfigError { .. }
            | BurstError::InvalidConfigValueError { .. }
            | BurstError::ConfigValidationError { .. } => {
                "Fix the configuration value and run again (see --help)".to_string()
            }
            BurstError::IoError(_) | BurstError::CsvError(_) | BurstError::SerializationError(_) => {
                "Check that the report path is writable".to_string()
            }
            BurstError::TaskPanicked { .. } => "This is a bug, please report it".to_string(),
            BurstError::AbortedAfterFailure { source, .. } => source.recovery_suggestion(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BurstError::ConnectError { target, .. } => {
                format!("Could not open socket to {}", target)
            }
            BurstError::MissingConfigError { field } => {
                format!("Missing required configuration: {}", field)
            }
            BurstError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            BurstError::AbortedAfterFailure { task, source } => {
                format!("Burst stopped at task {}: {}", task, source.user_friendly_message())
            }
            other => other.to_string(),
        }
    }

    /// Exit code used by the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BurstError>;
