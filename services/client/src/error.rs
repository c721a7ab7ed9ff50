//! services/client/src/error.rs
//!
//! Defines the primary error type for the terminal client.

use crate::config::ConfigError;
use job_board_core::{ControllerError, PortError};

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error reported by one of the core controllers.
    #[error("Controller Error: {0}")]
    Controller(#[from] ControllerError),

    /// Represents a standard Input/Output error (e.g., reading the store file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
