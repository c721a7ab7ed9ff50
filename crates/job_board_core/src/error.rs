//! crates/job_board_core/src/error.rs
//!
//! Error type surfaced by the controllers.

use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    /// The gateway rejected the call (network, server or validation failure).
    #[error("Backend request failed: {0}")]
    Network(#[from] PortError),

    /// A "load more" was requested without a usable continuation token.
    #[error("No continuation token is available for the next page")]
    StaleContinuation,

    /// A page request was issued while another one is still in flight.
    #[error("Another page request is already in flight")]
    ConcurrentLoad,

    /// A newer load or search replaced this request before its response arrived.
    /// The response was discarded and the listing set was left untouched.
    #[error("The request was superseded by a newer one")]
    Superseded,

    /// Persisted client state could not be encoded or decoded.
    #[error("Client store error: {0}")]
    Store(String),
}

pub type ControllerResult<T> = Result<T, ControllerError>;
