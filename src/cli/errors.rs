//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints them and exits non-zero.

use std::fmt;

use crate::errors::RouterError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Invalid command argument
    ArgumentError,
    /// A routing operation failed
    RoutingError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "LAGROUTE_CLI_CONFIG_ERROR",
            Self::ArgumentError => "LAGROUTE_CLI_ARGUMENT_ERROR",
            Self::RoutingError => "LAGROUTE_CLI_ROUTING_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<RouterError> for CliError {
    fn from(err: RouterError) -> Self {
        let code = match err {
            RouterError::Configuration { .. } => CliErrorCode::ConfigError,
            _ => CliErrorCode::RoutingError,
        };
        Self::new(code, err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
