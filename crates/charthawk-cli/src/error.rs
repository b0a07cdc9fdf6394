//! CLI error types with exit code handling
//!
//! Maps crate errors onto user-facing diagnostics and exit codes.

#![allow(dead_code)] // Some variants/methods are for future use

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration file missing or invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(charthawk::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The discovery pipeline failed
    #[error("Discovery failed: {message}")]
    #[diagnostic(code(charthawk::cli::discovery))]
    Discovery { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(charthawk::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(charthawk::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Discovery { .. } => exit_codes::DISCOVERY_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<charthawk_core::CoreError> for CliError {
    fn from(err: charthawk_core::CoreError) -> Self {
        CliError::Config {
            message: err.to_string(),
            help: None,
        }
    }
}

impl From<charthawk_repo::RepoError> for CliError {
    fn from(err: charthawk_repo::RepoError) -> Self {
        CliError::Discovery {
            message: err.to_string(),
        }
    }
}

impl From<charthawk_discover::DiscoverError> for CliError {
    fn from(err: charthawk_discover::DiscoverError) -> Self {
        CliError::Discovery {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
