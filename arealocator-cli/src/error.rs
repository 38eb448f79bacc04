//! CLI error types.

use std::fmt;

use arealocator::config::ConfigError;

/// Errors that can occur during service startup and operation.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be read or validated.
    Config(ConfigError),

    /// A component could not be initialized (HTTP client, district index).
    Startup(String),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),

    /// The HTTP server failed while serving.
    Serve(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Startup(msg) => write!(f, "Failed to start service: {}", msg),
            CliError::RuntimeCreation(msg) => {
                write!(f, "Failed to create Tokio runtime: {}", msg)
            }
            CliError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Serve(e) => Some(e),
            CliError::Startup(_) | CliError::RuntimeCreation(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}
